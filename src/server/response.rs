use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder};
use serde::{Deserialize, Serialize};

use crate::decision::{Denial, DenialKind};

/// Envelope of every successful or generic error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommonResponse<T> {
    pub code: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Body of a 401, e.g.
/// `{"statusCode": 401, "error": {"name": "UnauthorizedError", "message": ".."}}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DenialResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub error: DenialBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DenialBody {
    pub name: String,
    pub message: String,
}

impl From<&Denial> for DenialResponse {
    fn from(denial: &Denial) -> Self {
        let (status, name) = match denial.kind {
            DenialKind::Unauthorized => (StatusCode::UNAUTHORIZED, "UnauthorizedError"),
        };
        Self {
            status_code: status.as_u16(),
            error: DenialBody {
                name: String::from(name),
                message: denial.message.clone(),
            },
        }
    }
}

pub struct Response {
    http_response: HttpResponse,
}

impl Response {
    pub fn ok() -> Self {
        Self::with_status::<()>(StatusCode::OK, None, None)
    }

    pub fn json<T: Serialize>(data: T) -> Self {
        Self::with_status(StatusCode::OK, None, Some(data))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status::<()>(StatusCode::NOT_FOUND, Some(message.into()), None)
    }

    pub fn method_not_allowed() -> Self {
        Self::with_status::<()>(
            StatusCode::METHOD_NOT_ALLOWED,
            Some(String::from("Method not allowed")),
            None,
        )
    }

    pub fn error(message: &str) -> Self {
        let message = format!("Server error: {message}");
        Self::with_status::<()>(StatusCode::INTERNAL_SERVER_ERROR, Some(message), None)
    }

    pub fn denied(denial: &Denial) -> Self {
        let body = DenialResponse::from(denial);
        let status =
            StatusCode::from_u16(body.status_code).unwrap_or(StatusCode::UNAUTHORIZED);
        Self {
            http_response: HttpResponseBuilder::new(status).json(body),
        }
    }

    fn with_status<T: Serialize>(status: StatusCode, message: Option<String>, data: Option<T>) -> Self {
        let resp = CommonResponse {
            code: status.as_u16(),
            message,
            data,
        };
        Self {
            http_response: HttpResponseBuilder::new(status).json(resp),
        }
    }
}

impl From<Response> for HttpResponse {
    fn from(val: Response) -> Self {
        val.http_response
    }
}

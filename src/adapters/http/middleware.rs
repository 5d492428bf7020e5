use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::{adapters::http::app_state::AppState, app_error::AppError, infra::config::AdminAuth};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminAuthMethod {
    Token,
    Disabled,
}

/// The authenticated operator, inserted into request extensions by
/// `admin_auth_middleware`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdminPrincipal {
    pub method: AdminAuthMethod,
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl AdminAuth {
    pub fn authenticate(&self, presented: Option<&str>) -> Result<AdminPrincipal, AppError> {
        match self {
            AdminAuth::Disabled => Ok(AdminPrincipal {
                method: AdminAuthMethod::Disabled,
            }),
            AdminAuth::Token(expected) => match presented {
                Some(token)
                    if constant_time_eq(token.as_bytes(), expected.expose_secret().as_bytes()) =>
                {
                    Ok(AdminPrincipal {
                        method: AdminAuthMethod::Token,
                    })
                }
                _ => Err(AppError::Unauthorized),
            },
        }
    }
}

pub async fn admin_auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = app_state
        .config
        .admin_auth
        .authenticate(bearer_token(&request))
        .inspect_err(|_| {
            tracing::warn!(
                uri = %request.uri(),
                "Rejected admin request with missing or invalid token"
            );
        })?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

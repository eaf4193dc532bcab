use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use shared_models::error::AppError;
use shared_utils::extractor::extract_user;

use crate::services::resolver::TenantResolver;

// Must run after auth_middleware so the User extension is present
pub async fn tenant_context_middleware(
    State(resolver): State<TenantResolver>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = extract_user(&request)?;

    let context = resolver
        .staff_context(user.role.as_deref(), user.company_id.as_deref())
        .await?;

    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

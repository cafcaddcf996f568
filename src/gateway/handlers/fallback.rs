//! 未匹配路由的处理器

use axum::http::{Method, Uri};

use crate::error::GatewayError;

/// 未知路径
pub async fn handle_not_found(uri: Uri) -> GatewayError {
    GatewayError::NotFound(uri.path().to_string())
}

/// 路径存在但方法不匹配
pub async fn handle_method_not_allowed(method: Method, uri: Uri) -> GatewayError {
    GatewayError::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}

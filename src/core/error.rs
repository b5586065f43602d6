//! 行程编排错误类型
//!
//! 只有 PlanningUnavailable / PlanningRejected / InvalidRequest 会进入用户可见的错误状态；
//! 其余都在本地以安全默认值吸收，保证行程始终可渲染。

use thiserror::Error;

use crate::service::ServiceError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TourError {
    /// 粗略分段获取失败或返回零段
    #[error("Planning unavailable: {0}")]
    PlanningUnavailable(String),

    /// 规划服务返回的结构化错误，原样展示
    #[error("{0}")]
    PlanningRejected(String),

    /// 单段补全失败（本地恢复为降级 Stage）
    #[error("Detail unavailable: {0}")]
    DetailUnavailable(String),

    /// 持久化内容无法解析（按空存储处理）
    #[error("Store corrupt: {0}")]
    StoreCorrupt(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TourError {
    /// 是否应展示给用户
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            TourError::PlanningUnavailable(_)
                | TourError::PlanningRejected(_)
                | TourError::InvalidRequest(_)
        )
    }

    /// 规划调用的错误归类：结构化拒绝原样透传，其余视为规划不可用
    pub fn from_planning(err: ServiceError) -> Self {
        match err {
            ServiceError::Rejected(msg) => TourError::PlanningRejected(msg),
            other => TourError::PlanningUnavailable(other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for TourError {
    fn from(e: rusqlite::Error) -> Self {
        TourError::Storage(e.to_string())
    }
}

impl From<std::io::Error> for TourError {
    fn from(e: std::io::Error) -> Self {
        TourError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_policy() {
        assert!(TourError::PlanningUnavailable("x".into()).is_user_visible());
        assert!(TourError::PlanningRejected("x".into()).is_user_visible());
        assert!(!TourError::DetailUnavailable("x".into()).is_user_visible());
        assert!(!TourError::StoreCorrupt("x".into()).is_user_visible());
        assert!(!TourError::Storage("x".into()).is_user_visible());
    }

    #[test]
    fn test_from_planning() {
        assert_eq!(
            TourError::from_planning(ServiceError::Rejected("no route found".into())),
            TourError::PlanningRejected("no route found".into())
        );
        assert!(matches!(
            TourError::from_planning(ServiceError::Status(502)),
            TourError::PlanningUnavailable(_)
        ));
    }

    #[test]
    fn test_rejected_is_verbatim() {
        assert_eq!(TourError::PlanningRejected("no route found".into()).to_string(), "no route found");
    }
}

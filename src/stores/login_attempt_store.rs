use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::errors::InternalError;
use crate::errors::internal::AuditError;
use crate::types::db::login_attempt::{self, Entity as LoginAttempt};
use crate::types::internal::{FailReason, LoginLogFilter};

/// One login attempt about to be appended to the log
#[derive(Debug, Clone)]
pub struct NewLoginAttempt {
    pub email: String,
    pub success: bool,
    pub fail_reason: Option<FailReason>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub user_id: Option<String>,
}

/// Append-only store over the audit database
///
/// Owns its connection because the audit database is separate from the
/// auth database and never joins its transactions.
#[derive(Debug, Clone)]
pub struct LoginAttemptStore {
    db: DatabaseConnection,
}

impl LoginAttemptStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn record(&self, attempt: NewLoginAttempt) -> Result<(), InternalError> {
        login_attempt::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            email: Set(attempt.email),
            success: Set(attempt.success),
            fail_reason: Set(attempt.fail_reason.map(|r| r.as_str().to_string())),
            ip_address: Set(attempt.ip_address),
            user_agent: Set(attempt.user_agent),
            user_id: Set(attempt.user_id),
            created_at: Set(Utc::now().timestamp()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| AuditError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    /// Newest first, capped at the filter's effective limit
    pub async fn find(
        &self,
        filter: &LoginLogFilter,
    ) -> Result<Vec<login_attempt::Model>, InternalError> {
        let mut query = LoginAttempt::find();

        if let Some(user_id) = &filter.user_id {
            query = query.filter(login_attempt::Column::UserId.eq(user_id.as_str()));
        }
        if let Some(email) = &filter.email {
            let pattern = format!("%{}%", escape_like(&email.trim().to_lowercase()));
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(login_attempt::Column::Email)))
                    .like(LikeExpr::new(pattern).escape('\\')),
            );
        }
        if let Some(success) = filter.success {
            query = query.filter(login_attempt::Column::Success.eq(success));
        }
        if let Some(start) = filter.start {
            query = query.filter(login_attempt::Column::CreatedAt.gte(start));
        }
        if let Some(end) = filter.end {
            query = query.filter(login_attempt::Column::CreatedAt.lte(end));
        }

        query
            .order_by_desc(login_attempt::Column::CreatedAt)
            .order_by_desc(login_attempt::Column::Id)
            .limit(filter.effective_limit())
            .all(&self.db)
            .await
            .map_err(|e| AuditError::QueryFailed(e.to_string()).into())
    }
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

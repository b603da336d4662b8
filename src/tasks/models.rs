use serde::{Deserialize, Serialize};

/// A task, owned by exactly one account for its whole life
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub owner_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
}

/// Update body. `owner_id` is optional; when present it must be the caller.
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub id: String,
    pub title: String,
    #[serde(default, alias = "ownerId")]
    pub owner_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteTaskRequest {
    #[serde(alias = "taskId")]
    pub task_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_request_accepts_both_spellings() {
        let snake: DeleteTaskRequest = serde_json::from_str(r#"{"task_id":"t1"}"#).unwrap();
        let camel: DeleteTaskRequest = serde_json::from_str(r#"{"taskId":"t1"}"#).unwrap();
        assert_eq!(snake.task_id, "t1");
        assert_eq!(camel.task_id, "t1");
    }

    #[test]
    fn test_update_request_owner_optional() {
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"id":"t1","title":"buy bread"}"#).unwrap();
        assert!(req.owner_id.is_none());
    }
}

// Route path constants - single source of truth for all API paths

pub const UPLOAD: &str = "/upload";
pub const GET_COMPLETED: &str = "/getCompleted";
pub const GET_COMMENT: &str = "/get";
pub const PUT_COMMENT: &str = "/put";
pub const HEALTH: &str = "/health";

pub const SWAGGER_UI: &str = "/swagger-ui";
pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";

/// Response header carrying the continuation cursor of a key listing
pub const LIST_CURSOR_HEADER: &str = "x-list-cursor";

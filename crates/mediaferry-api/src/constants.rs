/// Prefix of every versioned API route.
pub const API_PREFIX: &str = "/api/v0";

/// Multipart field names of the upload form.
pub mod fields {
    pub const OWNER: &str = "email";
    pub const SECRET: &str = "password";
    pub const MODE: &str = "mode";
    pub const DESTINATION: &str = "filePath";
    pub const FILE: &str = "file";
}

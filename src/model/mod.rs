//! Data types shared by the services and processes

crate::using! {
    pub completion,
    pub dependency,
    pub docs,
    pub file,
    pub http,
    pub pattern,
}

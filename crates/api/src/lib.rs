//! HTTP front end: certificate requests in, certificates (or denials) out.

pub mod app;

pub mod client;
pub mod server;

pub use client::{HttpLtiServiceClient, LtiServiceClient, ServiceRequestOptions, ServiceResponse};
pub use server::{LtiServiceServer, LtiServiceServerRequestHandler};

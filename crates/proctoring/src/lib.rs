//! LTI Proctoring: the Start Proctoring, Start Assessment and End Assessment
//! launches, and the Assessment Control Service (ACS) models, serializers,
//! client and server handler.

pub mod error;
pub mod factory;
pub mod message;
pub mod model;
pub mod serializer;
pub mod service;

pub use error::ValidationError;
pub use message::{AcsClaim, ProctoringPayloadExt};
pub use model::{AcsAction, AcsControl, AcsControlResult, AcsStatus};
pub use serializer::{AcsControlResultSerializer, AcsControlSerializer};
pub use service::{AcsControlProcessor, AcsServiceClient, AcsServiceServerRequestHandler};

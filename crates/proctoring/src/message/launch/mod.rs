pub mod end_assessment;
pub mod start_assessment;
pub mod start_proctoring;

pub use end_assessment::{EndAssessmentLaunchRequest, EndAssessmentLaunchRequestBuilder};
pub use start_assessment::{StartAssessmentLaunchRequest, StartAssessmentLaunchRequestBuilder};
pub use start_proctoring::{StartProctoringLaunchRequest, StartProctoringLaunchRequestBuilder};

use lti_core::message::ROLE_LEARNER;

fn default_roles() -> Vec<String> {
    vec![ROLE_LEARNER.to_string()]
}

use crate::gateway::CompletionGateway;
use crate::rate_limit::AdmissionController;

// app's shared state
pub struct AppState {
    pub admission: AdmissionController, // per-client request cap
    pub gateway: CompletionGateway,     // validation + upstream call
}

// Request handlers: thin translations from HTTP onto the service layer.
// Domain outcomes map to responses here; the services never see HTTP.

pub mod achievement;
pub mod attempt;
pub mod course;
pub mod enrollment;

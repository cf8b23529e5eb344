// Resume uploads, PDF text extraction and ATS scoring.

pub mod ats;
pub mod extract;
pub mod handlers;
pub mod prompts;

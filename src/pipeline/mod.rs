//! Pipeline stages for image analysis.
//!
//! Each submodule implements exactly one step, so each can be tested
//! without the others.
//!
//! ## Data Flow
//!
//! ```text
//! request ──▶ vision ──▶ structure ──▶ sanitize ──▶ validate
//! (URL+mode)  (VLM)      (LLM, t=0)    (fences)     (schema)
//! ```
//!
//! 1. [`request`]: check image references against the trusted domains
//!    before anything leaves the process
//! 2. [`vision`]: one multimodal call producing a free-text description;
//!    [`images`] prepares the image parts for the client's transport
//! 3. [`structure`]: one text call coercing the description into JSON
//! 4. [`sanitize`]: strip code fences and surrounding whitespace
//! 5. [`validate`]: parse, check the schema, build the typed record
//!
//! [`llm`] holds the timeout/retry wrapper shared by both remote calls.

pub mod images;
pub mod llm;
pub mod request;
pub mod sanitize;
pub mod structure;
pub mod validate;
pub mod vision;

//! Pipeline stages for remote-OCR conversion.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap
//! implementations (e.g. point at another OCR provider) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! remote ──▶ normalize ──▶ assemble
//! (3 calls)  (canonical)   (Markdown)
//!               │
//!               └─ render  (block → fragment, used per page)
//!
//! fallback — entered from the outer boundary when any stage fails
//! ```
//!
//! 1. [`remote`]    — upload, signed-URL fetch, OCR request; the only stage
//!    with network I/O
//! 2. [`normalize`] — provider JSON (any of four shapes) → canonical
//!    `{document_info, pages}` model; degrades instead of failing
//! 3. [`render`]    — typed content block → Markdown fragment; failures are
//!    isolated per block
//! 4. [`assemble`]  — canonical model + metadata → final document
//! 5. [`fallback`]  — minimal always-valid document for the failure path

pub mod assemble;
pub mod fallback;
pub mod normalize;
pub mod remote;
pub mod render;

//! Public entry points
//!
//! - `copy`: multi-source copy and its single-source adapter
//! - `mv`: multi-source move and its single-source adapter
//!
//! Both families share the retry-as-child fallback: when the destination
//! already exists, a single-source call is retried once with the source's
//! basename appended to the destination.

pub mod copy;
pub mod mv;

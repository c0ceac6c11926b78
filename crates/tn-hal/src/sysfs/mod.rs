//! sysfs readers.

pub mod block;

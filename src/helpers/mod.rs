//! Low-level readers shared by the workbook importers.

pub(crate) mod xml;
pub(crate) mod zip;

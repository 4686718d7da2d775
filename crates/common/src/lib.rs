// proforma-common: domain records and wire contract for the template editor

pub mod protocol;
pub mod types;

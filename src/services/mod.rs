pub mod price_service;
pub mod spike_service;
pub mod chart_service;

pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::repositories::CandidateRepository;
use crate::services::candidate_service::CandidateService;

#[derive(Clone)]
pub struct AppState {
    pub candidate_service: CandidateService,
}

impl AppState {
    pub fn new(repository: Arc<dyn CandidateRepository>) -> Self {
        Self {
            candidate_service: CandidateService::new(repository),
        }
    }
}

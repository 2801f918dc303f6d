pub mod seed_service;

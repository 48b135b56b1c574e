use crate::config::Config;
use mongodb::{Client as MongoClient, Database};

use self::judge::JudgeClient;
use self::openai::OpenAiClient;

pub struct AppState {
    pub config: Config,
    pub mongo: Database,
    pub openai: OpenAiClient,
    pub judge: JudgeClient,
}

impl AppState {
    pub fn new(config: Config, mongo_client: MongoClient) -> anyhow::Result<Self> {
        let mongo = mongo_client.database(&config.mongo_database);

        let openai = OpenAiClient::new(
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            config.openai_model.clone(),
        )?;

        let judge = JudgeClient::new(
            config.judge_url.clone(),
            config.judge_client_id.clone(),
            config.judge_client_secret.clone(),
        );

        Ok(Self {
            config,
            mongo,
            openai,
            judge,
        })
    }
}

pub mod answer_locator;
pub mod hint_engine;
pub mod interaction_service;
pub mod judge;
pub mod openai;

mod helpers;
mod azure_mock;
mod orchestrator;

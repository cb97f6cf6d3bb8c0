pub mod assistant;
pub mod chats;
pub mod messages;
pub mod plans;
pub mod profile;
pub mod prompts;

pub mod gamification;
pub mod handlers;
pub mod leaderboard;
pub mod plan;
pub mod prompts;

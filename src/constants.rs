//! Constants used throughout the application
//!
//! This module centralizes magic strings, user-facing text, and other constant values
//! to improve maintainability and consistency.

// Local settings keys
pub const SETTING_SUPABASE_URL: &str = "sb_url";
pub const SETTING_SUPABASE_KEY: &str = "sb_key";
pub const SETTING_SESSION: &str = "sb_session";

// Placeholder credentials used when nothing is configured
pub const PLACEHOLDER_URL: &str = "https://placeholder.supabase.co";
pub const PLACEHOLDER_KEY: &str = "placeholder";
pub const PLACEHOLDER_MARKER: &str = "placeholder";

// Default environment variable names
pub const DEFAULT_URL_ENV: &str = "SUPABASE_URL";
pub const DEFAULT_KEY_ENV: &str = "SUPABASE_ANON_KEY";
pub const DEFAULT_GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

// Storage
pub const AVATAR_BUCKET: &str = "avatars";
pub const AVATAR_DEFAULT_EXTENSION: &str = "png";
/// Largest avatar accepted by the CLI (2 MiB)
pub const AVATAR_MAX_BYTES: u64 = 2 * 1024 * 1024;
pub const AVATAR_SEED_URL: &str = "https://api.dicebear.com/7.x/avataaars/svg?seed=";

// Fallback profile values
pub const FALLBACK_NAME: &str = "User";
pub const FALLBACK_USERNAME: &str = "user";
pub const UNKNOWN_OWNER: &str = "Unknown";

// Error Messages
pub const ERROR_REGISTER_FAILED: &str = "Failed to register user";
pub const ERROR_LOGIN_FAILED: &str = "Invalid email or password";
pub const ERROR_LOAD_WORKOUTS: &str = "Failed to load workouts";
pub const ERROR_SAVE_WORKOUT: &str = "Failed to save workout";
pub const ERROR_SAVE_EXERCISES: &str = "Failed to save exercises";
pub const ERROR_SAVE_SETS: &str = "Failed to save sets";
pub const ERROR_NO_USER: &str = "No authenticated user";
pub const ERROR_AVATAR_UPLOAD: &str = "Failed to upload avatar. Your previous avatar is still in place.";
pub const ERROR_AVATAR_URL: &str = "Could not get public URL for avatar. Your previous avatar is still in place.";
pub const ERROR_AVATAR_PROFILE: &str = "Failed to update avatar profile. Your previous avatar is still in place.";
pub const ERROR_AVATAR_NOT_IMAGE: &str = "Please choose an image file (png, jpg, jpeg, gif, webp or svg)";
pub const ERROR_AVATAR_TOO_LARGE: &str = "Image must be smaller than 2 MB";
pub const ERROR_WORKOUT_NAME_REQUIRED: &str = "Please give your workout a name";
pub const ERROR_WORKOUT_EXERCISES_REQUIRED: &str = "Please add at least one exercise";
pub const ERROR_NOT_CONFIGURED: &str =
    "❌ Supabase is not configured. Run `fittrack config set <url> <anon-key>` or set SUPABASE_URL and SUPABASE_ANON_KEY.";

// Coach
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const COACH_HISTORY_WINDOW: usize = 5;
pub const COACH_SUGGESTION_COUNT: usize = 5;
pub const COACH_PLAN_INSTRUCTION: &str = "You are an expert elite fitness coach. Create detailed, science-based workout plans. Be encouraging but concise. Use Markdown formatting for lists and bold text.";
pub const COACH_ANALYSIS_INSTRUCTION: &str = "You are a data-driven sports scientist. Analyze the user's recent volume and frequency. Keep advice actionable and brief.";
pub const COACH_GREETING: &str =
    "Hi! I'm your AI fitness coach. I can create workout plans or analyze your history. What's your goal today?";
pub const COACH_MISSING_KEY: &str = "API key is missing. Set GEMINI_API_KEY or configure coach.api_key_env.";
pub const COACH_PLAN_EMPTY: &str = "Could not generate a workout plan. Please try again.";
pub const COACH_PLAN_FAILED: &str = "Sorry, I encountered an error while communicating with the AI coach.";
pub const COACH_ANALYSIS_EMPTY: &str = "Analysis failed.";
pub const COACH_ANALYSIS_FAILED: &str = "Unable to analyze history at this time.";
pub const COACH_ANALYSIS_KEYWORDS: [&str; 3] = ["analyze", "history", "progress"];
pub const COACH_SUGGESTION_CHIPS: [&str; 4] = [
    "Generate a 30-min HIIT workout",
    "Analyze my workout volume",
    "Plan a heavy leg day",
    "Core workout for beginners",
];

// Success Messages
pub const SUCCESS_CONFIG_SAVED: &str = "✅ Supabase configuration saved";
pub const SUCCESS_CONFIG_CLEARED: &str = "✅ Supabase configuration cleared";
pub const SUCCESS_WORKOUT_SAVED: &str = "✅ Workout saved";
pub const SUCCESS_AVATAR_UPDATED: &str = "✅ Avatar updated";
pub const SUCCESS_LOGGED_OUT: &str = "✅ Logged out";
pub const CONFIG_GENERATED: &str = "✅ Generated default configuration file";

// Logging
/// Number of formatted log lines kept in memory
pub const LOG_BUFFER_CAPACITY: usize = 500;

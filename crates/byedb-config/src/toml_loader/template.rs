//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# ByeDB Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.
#
# Backends can also come from the environment:
#   GEMINI_API_KEY_LIST=key1,key2     one Gemini backend per key
#   GITHUB_TOKEN_LIST=tok1,tok2       one OpenAI-compatible backend per token
#   OPENAI_BASE_URL=...               endpoint for the token backends

# [[backends]]
# name = "gemini-1"
# kind = "gemini"        # gemini, openai
# api_key = ""
# model = "gemini-2.5-flash"
# weight = 1.0           # relative cost factor, > 0

# [[backends]]
# name = "gpt-1"
# kind = "openai"
# api_key = ""
# model = "gpt-4o"
# weight = 10.0
# base_url = "https://models.github.ai/inference"

[dispatch]
# max_attempts = 3       # 1-10
# timeout_secs = 60      # 1-600
# auth_denied = "skip"   # skip, disable

[sessions]
# capacity = 50          # 1-10000
# pending_ttl_secs = 1800  # 0 = never expire

[agent]
# max_depth = 20         # 1-100
# memory_capacity = 5    # 1-50
# default_mode = "agent" # agent, ask

[logging]
# level = "info"         # trace, debug, info, warn, error
# json = false
"##
    .to_string()
}

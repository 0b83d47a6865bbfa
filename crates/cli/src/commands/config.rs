use brewbot_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "telegram.bot_token",
        &redact_token(config.telegram.bot_token.expose_secret()),
    ));
    lines.push(render_line(
        "telegram.poll_timeout_secs",
        &config.telegram.poll_timeout_secs.to_string(),
    ));

    lines.push(render_line(
        "openai.api_key",
        &redact_token(config.openai.api_key.expose_secret()),
    ));
    lines.push(render_line("openai.base_url", &config.openai.base_url));
    lines.push(render_line("openai.chat_model", &config.openai.chat_model));
    lines.push(render_line("openai.embedding_model", &config.openai.embedding_model));
    lines.push(render_line(
        "openai.embedding_dimensions",
        &config.openai.embedding_dimensions.to_string(),
    ));
    lines.push(render_line("openai.timeout_secs", &config.openai.timeout_secs.to_string()));
    lines.push(render_line("openai.max_tokens", &config.openai.max_tokens.to_string()));
    lines.push(render_line("openai.temperature", &config.openai.temperature.to_string()));

    let pinecone_key = config
        .pinecone
        .api_key
        .as_ref()
        .map(|key| redact_token(key.expose_secret()))
        .unwrap_or_else(|| "<unset> (demo catalog mode)".to_string());
    lines.push(render_line("pinecone.api_key", &pinecone_key));
    lines.push(render_line("pinecone.index_name", &config.pinecone.index_name));
    lines.push(render_line("pinecone.controller_url", &config.pinecone.controller_url));
    lines.push(render_line("pinecone.top_k", &config.pinecone.top_k.to_string()));
    lines.push(render_line("pinecone.timeout_secs", &config.pinecone.timeout_secs.to_string()));

    lines.push(render_line(
        "observability.enabled",
        &config.observability.enabled.to_string(),
    ));
    lines.push(render_line(
        "observability.endpoint",
        config.observability.endpoint.as_deref().unwrap_or("<unset>"),
    ));
    let observability_key = config
        .observability
        .api_key
        .as_ref()
        .map(|key| redact_token(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());
    lines.push(render_line("observability.api_key", &observability_key));
    lines.push(render_line("observability.agent_name", &config.observability.agent_name));

    lines.push(render_line("prompt.version", &config.prompt.version));
    lines.push(render_line(
        "prompt.instructions_path",
        &config
            .prompt
            .instructions_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<builtin>".to_string()),
    ));

    lines.push(render_line("server.bind_address", &config.server.bind_address));
    lines.push(render_line(
        "server.health_check_port",
        &config.server.health_check_port.to_string(),
    ));
    lines.push(render_line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
    ));

    lines.push(render_line("logging.level", &config.logging.level));
    lines.push(render_line("logging.format", &format!("{:?}", config.logging.format)));

    lines.join("\n")
}

fn render_line(key: &str, value: &str) -> String {
    format!("- {key} = {value}")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once(':') {
        return format!("{prefix}:***");
    }
    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use super::redact_token;

    #[test]
    fn tokens_are_redacted_after_their_prefix() {
        assert_eq!(redact_token("123456789:abcdef"), "123456789:***");
        assert_eq!(redact_token("sk-super-secret"), "sk-***");
        assert_eq!(redact_token(""), "<empty>");
        assert_eq!(redact_token("opaque"), "<redacted>");
    }
}

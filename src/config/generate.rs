pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# KAFKA BROWSER CONFIGURATION
# =============================================================================
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/kafka-browser/config.yml
#   3. /etc/kafka-browser/config.yml
#
# Any value may reference an environment variable as $env{NAME}.

# =============================================================================
# KAFKA CLUSTER
# =============================================================================

kafka:
  brokers:
    - localhost:9092
  client_id: kafka-browser
  # Timeout for metadata, watermark and admin requests
  metadata_timeout: 10s
  # Startup connection attempts, with exponential backoff between them
  connect_retries: 5
  connect_backoff: 1s
  # Extra librdkafka properties, passed through unchanged
  properties: {}
  #   security.protocol: SASL_SSL
  #   sasl.mechanisms: PLAIN
  #   sasl.username: $env{KAFKA_USERNAME}
  #   sasl.password: $env{KAFKA_PASSWORD}

# =============================================================================
# SCHEMA REGISTRY (optional)
# =============================================================================
# When present, Avro payloads in the registry wire format are decoded to JSON.
# Omit this section to show every payload as raw text.

# schema_registry:
#   url: http://localhost:8081
#   timeout: 10s

# =============================================================================
# MESSAGE FETCHING
# =============================================================================

fetch:
  # Limit used when a request does not specify one
  default_limit: 100
  # Time limit for a single partition read; partial results are flagged
  timeout: 20s
  # Deadline for a whole cross-topic search
  cross_topic_timeout: 5m
  # Prefix for the throwaway consumer groups created per read
  group_prefix: kafka-browser

# =============================================================================
# CONSUMER GROUP CLEANUP
# =============================================================================

cleanup:
  # Delete attempts per throwaway group, including the first
  max_attempts: 4
  retry_delay: 300ms

# =============================================================================
# WEB SERVER
# =============================================================================

web:
  listen: 127.0.0.1:7070
  # Directory with the built UI; served under /assets with index.html fallback
  # assets_dir: ~/kafka-browser/ui/dist
"#
    .to_string()
}

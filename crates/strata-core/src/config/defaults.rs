// Single source of truth for all default values.

// --- Classifier ---
pub const DEFAULT_MIN_RULE_CONFIDENCE: f64 = 0.6;
pub const DEFAULT_CLASSIFIER_INFERENCE_TIMEOUT_MS: u64 = 3_000;
/// Every layer's weight in the GENERAL routing rule.
pub const DEFAULT_GENERAL_LAYER_WEIGHT: f64 = 0.5;
/// Every layer's weight when classification falls back. Kept below the GENERAL
/// rule so a failed classification never outranks a real GENERAL verdict.
pub const DEFAULT_FALLBACK_LAYER_WEIGHT: f64 = 0.3;

// --- Router ---
pub const DEFAULT_LAYER_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_MAX_RESULTS_PER_LAYER: usize = 20;
pub const DEFAULT_ROUTING_CACHE_ENABLED: bool = true;
pub const DEFAULT_ROUTING_CACHE_CAPACITY: u64 = 1_000;
pub const DEFAULT_ROUTING_CACHE_TTL_SECS: u64 = 300; // 5 minutes

// --- Fusion ---
pub const DEFAULT_MAX_TOKENS: usize = 4_000;
pub const DEFAULT_MIN_SCORE: f64 = 0.1;
pub const DEFAULT_DIVERSITY_WEIGHT: f64 = 0.1;
pub const DEFAULT_DEDUPLICATION_THRESHOLD: f64 = 0.85;

// --- Decomposition ---
pub const DEFAULT_DECOMPOSITION_ENABLED: bool = true;
pub const DEFAULT_MAX_SUB_QUERIES: usize = 5;
pub const DEFAULT_MIN_COMPLEXITY_INDICATORS: usize = 2;

// --- Multi-hop ---
pub const DEFAULT_MAX_CONCURRENT_HOPS: usize = 3;
pub const DEFAULT_HOP_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_PASS_DEPENDENCY_CONTEXT: bool = true;

// --- Combiner ---
pub const DEFAULT_COMBINE_MAX_RESULTS: usize = 30;

// --- Inference ---
pub const DEFAULT_INFERENCE_ENABLED: bool = false;
pub const DEFAULT_INFERENCE_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_INFERENCE_MODEL: &str = "llama3.2";
pub const DEFAULT_INFERENCE_REQUEST_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_INFERENCE_MAX_CONCURRENT: usize = 4;

// --- Tokens ---
pub const DEFAULT_TOKEN_CACHE_CAPACITY: u64 = 10_000;
pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

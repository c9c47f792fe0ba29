use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch records from the relational source and upsert them into the vector index
    Sync {
        /// Target collection (defaults to COLLECTION_COMPANY)
        #[arg(short, long)]
        collection: Option<String>,

        #[arg(short, long, default_value = "64")]
        batch_size: usize,

        /// Maximum number of records to fetch
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Find the records closest to a free-text query
    Search {
        query: String,

        #[arg(long, default_value = "5")]
        num: usize,

        #[arg(long)]
        json: bool,
    },

    /// Load and warm the embedding model and chat client, then print cache info
    Warm {
        /// Keep the chat model resident for this many seconds (0 or less: forever)
        #[arg(long, allow_negative_numbers = true)]
        keep_alive: Option<i64>,
    },

    Chat {
        prompt: String,

        #[arg(short, long)]
        system: Option<String>,

        /// Use the single-prompt generate endpoint instead of chat
        #[arg(long)]
        legacy: bool,
    },
}

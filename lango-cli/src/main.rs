use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clap::builder::RangedU64ValueParser;
use lango_core::corpus::read_corpora;
use lango_core::model::{Chain, DEFAULT_LOOKBACK, DEFAULT_MAX_LENGTH};
use log::info;

/// Makes up words for pretend languages from real-language corpora.
#[derive(Parser, Debug)]
#[command(name = "lango", version, about)]
struct Args {
    /// Path to a corpus file, can be specified multiple times to mix corpora
    #[arg(long = "corpus", value_name = "PATH", required = true)]
    corpora: Vec<PathBuf>,

    /// Number of preceding characters used to choose the next one
    #[arg(long, default_value_t = DEFAULT_LOOKBACK, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    lookback: usize,

    /// Number of words to generate
    #[arg(long, default_value_t = 1)]
    count: usize,

    /// Longest word the generator may produce before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_LENGTH, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    max_length: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Every corpus is read on its own thread
    let words = read_corpora(&args.corpora).context("failed to load corpora")?;
    info!("loaded {} words from {} corpora", words.len(), args.corpora.len());

    let chain = Chain::train_parallel(args.lookback, &words)?.with_max_length(args.max_length)?;
    info!("trained {} contexts", chain.len());

    for _ in 0..args.count {
        let word = chain.make_word().context("failed to generate a word")?;
        println!("{}", word);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_match_reference_behaviour() {
        let args = Args::try_parse_from(["lango", "--corpus", "french.txt"]).unwrap();
        assert_eq!(args.corpora, vec![PathBuf::from("french.txt")]);
        assert_eq!(args.lookback, 2);
        assert_eq!(args.count, 1);
        assert_eq!(args.max_length, DEFAULT_MAX_LENGTH);
    }

    #[test]
    fn corpora_can_be_mixed() {
        let args = Args::try_parse_from(["lango", "--corpus", "french.txt", "--corpus", "english.txt"]).unwrap();
        assert_eq!(args.corpora.len(), 2);
    }

    #[test]
    fn corpus_is_required() {
        assert!(Args::try_parse_from(["lango"]).is_err());
    }

    #[test]
    fn non_positive_lookback_is_rejected() {
        assert!(Args::try_parse_from(["lango", "--corpus", "a.txt", "--lookback", "0"]).is_err());
        assert!(Args::try_parse_from(["lango", "--corpus", "a.txt", "--lookback", "-1"]).is_err());
    }
}

use crate::service::BlockQuery;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "uclcoin", about = "Single-node ledger for a minimal proof-of-work coin")]
pub struct Opt {
    #[arg(long = "config", global = true, help = "TOML settings file")]
    pub config: Option<PathBuf>,
    #[arg(
        long = "chain-file",
        global = true,
        help = "Chain file or sled directory (overrides settings)"
    )]
    pub chain_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "balance", about = "Get the balance of an address")]
    Balance {
        #[arg(help = "The address (66 hex characters)")]
        address: String,
        #[arg(long = "unconfirmed", help = "Subtract pending outgoing spends")]
        unconfirmed: bool,
    },
    #[command(name = "pending", about = "List pending transactions in arrival order")]
    Pending,
    #[command(name = "block", about = "Print a committed block")]
    Block {
        #[arg(help = "Block index or 'last'")]
        query: BlockQuery,
    },
    #[command(name = "minable", about = "Print the next block template and its difficulty")]
    Minable {
        #[arg(help = "Address to receive the reward")]
        address: String,
    },
    #[command(name = "submit-block", about = "Submit a mined block record")]
    SubmitBlock {
        #[arg(help = "JSON file holding the block record, '-' for stdin")]
        file: PathBuf,
    },
    #[command(name = "submit-tx", about = "Submit a transaction record")]
    SubmitTx {
        #[arg(help = "JSON file holding the transaction record, '-' for stdin")]
        file: PathBuf,
    },
    #[command(name = "mine", about = "Mine blocks locally and submit them")]
    Mine {
        #[arg(help = "Address to receive the rewards")]
        address: String,
        #[arg(long = "blocks", default_value_t = 1, help = "How many blocks to mine")]
        blocks: u32,
    },
    #[command(name = "ranking", about = "Blocks mined per address")]
    Ranking,
    #[command(name = "avgtimes", about = "Average block times over the last 100 blocks")]
    Avgtimes,
    #[command(name = "verify", about = "Replay and re-check the whole chain")]
    Verify,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_block_query() {
        let opt = Opt::parse_from(["uclcoin", "block", "last"]);
        assert!(matches!(
            opt.command,
            Command::Block {
                query: BlockQuery::Last
            }
        ));

        let opt = Opt::parse_from(["uclcoin", "--chain-file", "/tmp/c.db", "block", "7"]);
        assert_eq!(opt.chain_file, Some(PathBuf::from("/tmp/c.db")));
        assert!(matches!(
            opt.command,
            Command::Block {
                query: BlockQuery::Index(7)
            }
        ));
    }

    #[test]
    fn test_invalid_block_query_is_rejected() {
        assert!(Opt::try_parse_from(["uclcoin", "block", "tip"]).is_err());
    }

    #[test]
    fn test_mine_defaults_to_one_block() {
        let opt = Opt::parse_from(["uclcoin", "mine", "02aa"]);
        assert!(matches!(opt.command, Command::Mine { blocks: 1, .. }));
    }
}

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

use fern::colors::ColoredLevelConfig;

use log::LevelFilter;

use palaver::auth::{Identity, IdentityProvider, StaticProvider};
use palaver::models::Database;
use palaver::models::NewBoard;
use palaver::{activity, services, Config, Result};

fn init_logging(config: &Config, verbose: bool) -> Result<()> {
    let colors = ColoredLevelConfig::new();

    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{}] {}",
                colors.color(record.level()),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout());

    if let Some(ref log_file) = config.log_file {
        dispatch = dispatch.chain(fern::log_file(log_file)?);
    }

    dispatch.apply()?;

    Ok(())
}

fn main_res() -> Result<()> {
    let matches = Command::new("palaverctl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Control a palaver discussion board")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .num_args(1)
                .help("Config file to use"),
        )
        .arg(
            Arg::new("database-url")
                .short('u')
                .long("database-url")
                .value_name("URL")
                .num_args(1)
                .help("URL to use to connect to the database"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .value_name("ID")
                .value_parser(clap::value_parser!(i32))
                .num_args(1)
                .help("The identity to act as"),
        )
        .arg(
            Arg::new("user-name")
                .long("user-name")
                .value_name("NAME")
                .num_args(1)
                .help("Display name for the acting identity"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand(
            Command::new("generate-config")
                .about("Print a config file with default values"),
        )
        .subcommand(
            Command::new("check-config")
                .about("Check configuration file for errors"),
        )
        .subcommand(
            Command::new("add-board")
                .about("Create a new board")
                .arg(
                    Arg::new("name")
                        .short('n')
                        .long("name")
                        .required(true)
                        .num_args(1)
                        .help("The name of the board"),
                )
                .arg(
                    Arg::new("description")
                        .short('d')
                        .long("description")
                        .required(true)
                        .num_args(1)
                        .help("The description of the board"),
                ),
        )
        .subcommand(Command::new("list-boards").about("List all boards"))
        .subcommand(
            Command::new("new-topic")
                .about("Start a new topic on a board")
                .arg(
                    Arg::new("board")
                        .short('b')
                        .long("board")
                        .value_parser(clap::value_parser!(i32))
                        .required(true)
                        .num_args(1)
                        .help("The board to start the topic on"),
                )
                .arg(
                    Arg::new("subject")
                        .short('s')
                        .long("subject")
                        .required(true)
                        .num_args(1)
                        .help("The subject of the topic"),
                )
                .arg(
                    Arg::new("message")
                        .short('m')
                        .long("message")
                        .required(true)
                        .num_args(1)
                        .help("The opening message of the topic"),
                ),
        )
        .subcommand(
            Command::new("reply")
                .about("Reply to an existing topic")
                .arg(
                    Arg::new("topic")
                        .short('t')
                        .long("topic")
                        .value_parser(clap::value_parser!(i32))
                        .required(true)
                        .num_args(1)
                        .help("The topic to reply to"),
                )
                .arg(
                    Arg::new("message")
                        .short('m')
                        .long("message")
                        .required(true)
                        .num_args(1)
                        .help("The reply message"),
                ),
        )
        .subcommand(
            Command::new("list-topics")
                .about("List one page of a board's topics")
                .arg(
                    Arg::new("board")
                        .short('b')
                        .long("board")
                        .value_parser(clap::value_parser!(i32))
                        .required(true)
                        .num_args(1)
                        .help("The board to list"),
                )
                .arg(
                    Arg::new("page")
                        .short('p')
                        .long("page")
                        .num_args(1)
                        .help("The page to show"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the page as JSON"),
                ),
        )
        .subcommand(
            Command::new("show-topic")
                .about("Show a topic and all of its posts")
                .arg(
                    Arg::new("topic")
                        .short('t')
                        .long("topic")
                        .value_parser(clap::value_parser!(i32))
                        .required(true)
                        .num_args(1)
                        .help("The topic to show"),
                )
                .arg(
                    Arg::new("viewer")
                        .long("viewer")
                        .value_name("TOKEN")
                        .num_args(1)
                        .help("Viewer token to count this view under"),
                ),
        )
        .subcommand(
            Command::new("edit-post")
                .about("Rewrite the message of an existing post")
                .arg(
                    Arg::new("post")
                        .long("post")
                        .value_parser(clap::value_parser!(i32))
                        .required(true)
                        .num_args(1)
                        .help("The post to edit"),
                )
                .arg(
                    Arg::new("message")
                        .short('m')
                        .long("message")
                        .required(true)
                        .num_args(1)
                        .help("The new message"),
                ),
        )
        .subcommand(
            Command::new("stats").about("Print topic and post counts"),
        )
        .get_matches();

    if matches.subcommand_matches("generate-config").is_some() {
        return Config::generate(std::io::stdout());
    }

    let conf_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(Config::default_path);

    let mut config = Config::open(&conf_path)?;

    if let Some(url) = matches.get_one::<String>("database-url") {
        config.database_url = url.to_owned();
    }

    init_logging(&config, matches.get_flag("verbose"))?;
    config.debug_log();

    if matches.subcommand_matches("check-config").is_some() {
        // Config::open would have failed on a bad file.
        println!("Configuration: {}", conf_path.display());
        println!("The config file is good.");
        return Ok(());
    }

    let provider = match matches.get_one::<i32>("user") {
        Some(&id) => {
            let name = matches
                .get_one::<String>("user-name")
                .cloned()
                .unwrap_or_else(|| format!("user{}", id));

            StaticProvider::new(Identity::new(id, name))
        }
        None => StaticProvider::anonymous(),
    };

    let db = Database::open(&config.database_url)?;

    if let Some(matches) = matches.subcommand_matches("add-board") {
        let board = db.insert_board(NewBoard {
            name: matches.get_one::<String>("name").unwrap(),
            description: matches.get_one::<String>("description").unwrap(),
        })?;

        println!("Created board #{} '{}'.", board.id, board.name);
    }

    if matches.subcommand_matches("list-boards").is_some() {
        for board in db.all_boards()? {
            println!("#{} {} - {}", board.id, board.name, board.description);
        }
    }

    if let Some(matches) = matches.subcommand_matches("new-topic") {
        let starter = provider.require_authenticated()?;

        let topic = services::create_topic(
            &db,
            *matches.get_one::<i32>("board").unwrap(),
            &starter,
            matches.get_one::<String>("subject").unwrap(),
            matches.get_one::<String>("message").unwrap(),
        )?;

        println!("Started topic #{}: {}", topic.id, topic.subject);
    }

    if let Some(matches) = matches.subcommand_matches("reply") {
        let author = provider.require_authenticated()?;

        let post = services::reply_topic(
            &db,
            *matches.get_one::<i32>("topic").unwrap(),
            &author,
            matches.get_one::<String>("message").unwrap(),
        )?;

        println!("Posted reply #{} to topic #{}.", post.id, post.topic_id);
    }

    if let Some(matches) = matches.subcommand_matches("list-topics") {
        let page = services::list_topics(
            &db,
            *matches.get_one::<i32>("board").unwrap(),
            matches.get_one::<String>("page").map(String::as_str),
        )?;

        if matches.get_flag("json") {
            let out = serde_json::json!({
                "page": page.num,
                "num_pages": page.num_pages,
                "has_next": page.has_next(),
                "has_previous": page.has_previous(),
                "topics": page.items,
            });

            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            println!("Page {} of {}", page.num, page.num_pages);

            for summary in &page.items {
                println!(
                    "#{} {} ({} replies, {} views, last active {})",
                    summary.topic.id,
                    summary.topic.subject,
                    summary.replies,
                    summary.topic.views,
                    summary.topic.last_updated,
                );
            }
        }
    }

    if let Some(matches) = matches.subcommand_matches("show-topic") {
        let topic_id = *matches.get_one::<i32>("topic").unwrap();

        if let Some(viewer) = matches.get_one::<String>("viewer") {
            services::record_view(&db, topic_id, viewer)?;
        }

        let topic = db.topic(topic_id)?;
        let replies = activity::reply_count(&db, topic_id)?;

        println!(
            "Topic #{}: {} ({} replies, {} views)",
            topic.id, topic.subject, replies, topic.views
        );

        for post in db.posts_in_topic(topic_id)? {
            let edited = match post.updated_at {
                Some(at) => format!(" (edited {})", at),
                None => String::new(),
            };

            println!(
                "  #{} by user #{} at {}{}",
                post.id, post.created_by, post.created_at, edited
            );
            println!("    {}", post.message);
        }
    }

    if let Some(matches) = matches.subcommand_matches("edit-post") {
        let editor = provider.require_authenticated()?;

        let post = services::edit_post(
            &db,
            *matches.get_one::<i32>("post").unwrap(),
            &editor,
            matches.get_one::<String>("message").unwrap(),
        )?;

        println!("Edited post #{}.", post.id);
    }

    if matches.subcommand_matches("stats").is_some() {
        println!("topics: {}", db.num_topics()?);
        println!("posts: {}", db.num_posts()?);
    }

    Ok(())
}

fn main() {
    if let Err(e) = main_res() {
        eprintln!("{}", e);

        // User mistakes (bad input, unknown IDs, missing identity) exit 1;
        // storage and infrastructure faults exit 2.
        std::process::exit(if e.is_recoverable() { 1 } else { 2 });
    }
}

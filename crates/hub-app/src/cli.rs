use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use hub_types::{FrameStyle, Role};
use hub_views::radar::RoleFilter;

/// SocialHub from the terminal.
#[derive(Parser, Debug)]
#[command(name = "hub", version)]
#[command(about = "SocialHub client: directory, gallery, messages and admin console", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account and sign in
    Register {
        email: String,
        username: String,
        #[arg(long)]
        password: String,
        /// TYPE_1, TYPE_2 or TYPE_3
        #[arg(long, default_value = "TYPE_1")]
        role: Role,
        #[arg(long)]
        display_name: Option<String>,
    },
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Show the signed-in account
    Whoami,
    /// The member directory
    Users {
        /// ALL or one tier
        #[arg(long, default_value = "ALL")]
        role: RoleFilter,
        #[arg(long)]
        search: Option<String>,
    },
    /// A profile page; your own without an argument
    Profile { user: Option<String> },
    Feed {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Post {
        #[arg(default_value = "")]
        content: String,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    DeletePost { id: Uuid },
    Like { post: Uuid },
    Dislike { post: Uuid },
    Comments { post: Uuid },
    Comment { post: Uuid, content: String },
    Conversations,
    /// Read a thread, marking it read
    Thread { user: String },
    Send {
        user: String,
        #[arg(default_value = "")]
        content: String,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// The group room
    Room {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Post to the group room
    Say {
        #[arg(default_value = "")]
        content: String,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Edit your profile
    Settings {
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        /// Image file to upload as the new avatar
        #[arg(long)]
        avatar: Option<PathBuf>,
    },
    Password {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
    AdminUsers {
        #[arg(long)]
        search: Option<String>,
    },
    AdminStats,
    AdminUpdate {
        user: String,
        #[arg(long)]
        role: Option<Role>,
        #[arg(long)]
        frame: Option<FrameStyle>,
        #[arg(long)]
        shiny: Option<bool>,
        #[arg(long)]
        verified: Option<bool>,
    },
    AdminDeleteUser { user: String },
    AdminDeletePost { id: Uuid },
    /// Follow a screen, printing each refresh until Ctrl-C
    Watch {
        screen: Screen,
        /// Counterpart for the thread screen
        user: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Screen {
    Conversations,
    Thread,
    Room,
}

use super::*;

/// Upper bound on blocks in a world created by command.
const MAX_NEW_WORLD_VOLUME: usize = 512 * 256 * 512;

const HELP: &[&str] = &[
    "Commands: help, who, worlds, goto <world> [observe]",
    "Operator: say, kick, lock, unlock, setblock, fill, newworld",
];

/// Who issued a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CommandSource {
    Console,
    Player(SessionId),
}

fn needs_operator(command: &str) -> bool {
    matches!(
        command,
        "say" | "kick" | "lock" | "unlock" | "setblock" | "fill" | "newworld"
    )
}

fn parse_pos(args: &[&str]) -> Option<BlockPos> {
    match args {
        [x, y, z] => Some(BlockPos::new(x.parse().ok()?, y.parse().ok()?, z.parse().ok()?)),
        _ => None,
    }
}

type CommandResult = Result<String, String>;

impl ConnectionHandler {
    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Run a line typed at the server console and return its output.
    pub fn handle_console_command(&mut self, line: &str) -> String {
        let output = self.run_command(CommandSource::Console, line);
        for line in output.lines() {
            info!("{line}");
        }
        self.reap();
        output
    }

    pub(super) fn run_player_command(&mut self, id: SessionId, line: &str) {
        let output = self.run_command(CommandSource::Player(id), line);
        for line in output.lines() {
            self.message(id, line);
        }
    }

    fn run_command(&mut self, source: CommandSource, line: &str) -> String {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return String::new();
        };
        let command = command.to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        if needs_operator(&command) && !self.is_operator(source) {
            return format!("You need operator rank to use {command}");
        }

        let result = match command.as_str() {
            "help" => Ok(HELP.join("\n")),
            "who" | "list" => Ok(self.cmd_who()),
            "worlds" => Ok(self.cmd_worlds()),
            "goto" => self.cmd_goto(source, &args),
            "say" => self.cmd_say(&args),
            "kick" => self.cmd_kick(&args),
            "lock" => self.cmd_lock(&args, true),
            "unlock" => self.cmd_lock(&args, false),
            "setblock" => self.cmd_setblock(source, &args),
            "fill" => self.cmd_fill(source, &args),
            "newworld" => self.cmd_newworld(&args),
            "stop" => self.cmd_stop(source),
            _ => Err(format!("Unknown command: {command}. Type help for a list")),
        };
        match result {
            Ok(output) | Err(output) => output,
        }
    }

    fn is_operator(&self, source: CommandSource) -> bool {
        match source {
            CommandSource::Console => true,
            CommandSource::Player(id) => self.rank_of(id) >= Rank::Operator,
        }
    }

    /// World a command acts on: the player's own, or the main world.
    fn target_world(&self, source: CommandSource) -> String {
        let current = match source {
            CommandSource::Player(id) => self.worlds.world_of(id),
            CommandSource::Console => None,
        };
        current
            .map_or(self.worlds.main_name(), |w| w.name())
            .to_string()
    }

    // -----------------------------------------------------------------------
    // Information
    // -----------------------------------------------------------------------

    fn cmd_who(&self) -> String {
        let names: Vec<&str> = self
            .sessions
            .values()
            .filter(|s| s.is_playing())
            .filter_map(|s| s.name())
            .collect();
        format!("Online ({}): {}", names.len(), names.join(", "))
    }

    fn cmd_worlds(&self) -> String {
        let worlds: Vec<String> = self
            .worlds
            .iter()
            .map(|w| {
                let lock = if w.is_locked() { ", locked" } else { "" };
                format!("{} ({}{lock})", w.name(), w.member_count())
            })
            .collect();
        format!("Worlds: {}", worlds.join(", "))
    }

    // -----------------------------------------------------------------------
    // Movement
    // -----------------------------------------------------------------------

    fn cmd_goto(&mut self, source: CommandSource, args: &[&str]) -> CommandResult {
        let CommandSource::Player(id) = source else {
            return Err("Only players can use goto".into());
        };
        let (target, mode) = match args {
            [target] => (*target, JoinMode::Participant),
            [target, "observe"] => (*target, JoinMode::Observer),
            _ => return Err("Usage: goto <world> [observe]".into()),
        };
        self.goto(id, target, mode).map_err(|e| e.to_string())?;
        let name = self.worlds.world_of(id).map_or(target, |w| w.name());
        Ok(format!("Moved to {name}"))
    }

    // -----------------------------------------------------------------------
    // Moderation
    // -----------------------------------------------------------------------

    fn cmd_say(&mut self, args: &[&str]) -> CommandResult {
        if args.is_empty() {
            return Err("Usage: say <message>".into());
        }
        self.broadcast(&format!("[Server] {}", args.join(" ")));
        Ok(String::new())
    }

    fn cmd_kick(&mut self, args: &[&str]) -> CommandResult {
        let [name, reason @ ..] = args else {
            return Err("Usage: kick <player> [reason]".into());
        };
        let id = self
            .session_by_name(name)
            .ok_or_else(|| format!("{name} is not online"))?;
        let reason = if reason.is_empty() {
            "Kicked by an operator".to_string()
        } else {
            reason.join(" ")
        };
        self.kick(id, &reason);
        Ok(format!("Kicked {name}"))
    }

    fn cmd_lock(&mut self, args: &[&str], locked: bool) -> CommandResult {
        let [name] = args else {
            return Err(format!(
                "Usage: {} <world>",
                if locked { "lock" } else { "unlock" }
            ));
        };
        let world = self
            .worlds
            .get_mut(name)
            .ok_or_else(|| format!("no world named '{name}'"))?;
        world.set_locked(locked);
        let state = if locked { "locked" } else { "unlocked" };
        info!(world = world.name(), "World {state}");
        Ok(format!("World {} {state}", world.name()))
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    fn cmd_setblock(&mut self, source: CommandSource, args: &[&str]) -> CommandResult {
        let usage = || "Usage: setblock <x> <y> <z> <block>".to_string();
        let [x, y, z, block] = args else {
            return Err(usage());
        };
        let pos = parse_pos(&[*x, *y, *z]).ok_or_else(usage)?;
        let block: u8 = block.parse().map_err(|_| usage())?;

        let target = self.target_world(source);
        self.set_block(&target, pos, block)
            .map_err(|e| e.to_string())?;
        Ok(format!("Set {pos} to {block} in {target}"))
    }

    fn cmd_fill(&mut self, source: CommandSource, args: &[&str]) -> CommandResult {
        let usage = || "Usage: fill <x1> <y1> <z1> <x2> <y2> <z2> <block>".to_string();
        let [a @ .., block] = args else {
            return Err(usage());
        };
        if a.len() != 6 {
            return Err(usage());
        }
        let from = parse_pos(&a[..3]).ok_or_else(usage)?;
        let to = parse_pos(&a[3..]).ok_or_else(usage)?;
        let block: u8 = block.parse().map_err(|_| usage())?;

        let target = self.target_world(source);
        let changed = self
            .fill(&target, from, to, block)
            .map_err(|e| e.to_string())?;
        Ok(format!("Filled {changed} blocks"))
    }

    fn cmd_newworld(&mut self, args: &[&str]) -> CommandResult {
        let usage = || "Usage: newworld <name> <x> <y> <z>".to_string();
        let [name, dims @ ..] = args else {
            return Err(usage());
        };
        let [x, y, z] = dims else {
            return Err(usage());
        };
        let dims = Dimensions::new(
            x.parse().map_err(|_| usage())?,
            y.parse().map_err(|_| usage())?,
            z.parse().map_err(|_| usage())?,
        );
        if dims.volume() > MAX_NEW_WORLD_VOLUME {
            return Err("World too large".into());
        }
        self.create_world(name, dims).map_err(|e| e.to_string())?;
        Ok(format!("Created world {name} ({}x{}x{})", dims.x, dims.y, dims.z))
    }

    // -----------------------------------------------------------------------
    // Server
    // -----------------------------------------------------------------------

    fn cmd_stop(&mut self, source: CommandSource) -> CommandResult {
        if source != CommandSource::Console {
            return Err("stop can only be used from the console".into());
        }
        let _ = self.shutdown_tx.send(true);
        Ok("Stopping server".into())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::*;
    use super::*;
    use mcc_rs_world::block;

    #[test]
    fn guests_cannot_run_operator_commands() {
        let (mut handler, _) = handler_with(CONFIG);
        let mut alice = login(&mut handler, 1, "alice");
        alice.drain();

        send(&mut handler, &alice, chat("/fill 0 0 0 1 1 1 1"));
        assert_eq!(
            alice.chat_lines(),
            vec!["You need operator rank to use fill"]
        );
        let main = handler.worlds.get("main").unwrap();
        assert_eq!(main.world().get(BlockPos::new(0, 0, 0)), Some(block::BEDROCK));
    }

    #[test]
    fn operator_fill_reaches_everyone() {
        let (mut handler, _) = handler_with(CONFIG);
        let mut op = login(&mut handler, 1, "op");
        let mut alice = login(&mut handler, 2, "alice");
        op.drain();
        alice.drain();

        send(&mut handler, &op, chat("/fill 0 0 0 1 1 1 1"));
        let updates = alice
            .drain()
            .into_iter()
            .filter(|p| matches!(p, ServerPacket::SetBlock(s) if s.block == block::STONE))
            .count();
        assert_eq!(updates, 8);
        assert_eq!(op.chat_lines(), vec!["Filled 8 blocks"]);
    }

    #[test]
    fn newworld_and_goto() {
        let (mut handler, _) = handler_with(CONFIG);
        let output = handler.handle_console_command("newworld arena 16 8 16");
        assert_eq!(output, "Created world arena (16x8x16)");
        assert!(handler
            .handle_console_command("newworld Arena 16 8 16")
            .contains("already exists"));

        let mut alice = login(&mut handler, 1, "alice");
        alice.drain();
        send(&mut handler, &alice, chat("/goto arena"));
        let packets = alice.drain();
        assert!(packets.contains(&ServerPacket::LevelInitialize));
        assert!(packets.iter().any(|p| matches!(
            p,
            ServerPacket::Message(m) if m.text == "Moved to arena"
        )));
        assert_eq!(handler.worlds.world_of(alice.id).unwrap().name(), "arena");
        assert_eq!(handler.worlds.get("main").unwrap().member_count(), 0);

        send(&mut handler, &alice, chat("/goto nowhere"));
        assert_eq!(alice.chat_lines(), vec!["no world named 'nowhere'"]);
        assert_eq!(handler.worlds.world_of(alice.id).unwrap().name(), "arena");
    }

    #[test]
    fn observers_are_not_announced() {
        let (mut handler, _) = handler_with(CONFIG);
        let mut alice = login(&mut handler, 1, "alice");
        let bob = login(&mut handler, 2, "bob");
        alice.drain();

        send(&mut handler, &bob, chat("/goto main observe"));
        // Already in main: refused, nothing changes for alice.
        assert!(alice.drain().is_empty());

        handler.handle_console_command("newworld arena 16 8 16");
        send(&mut handler, &bob, chat("/goto arena observe"));
        let packets = alice.drain();
        assert!(packets
            .iter()
            .any(|p| matches!(p, ServerPacket::DespawnPlayer(_))));
        let arena = handler.worlds.get("arena").unwrap();
        assert!(!arena.member(bob.id).unwrap().is_participant());
    }

    #[test]
    fn locked_world_refuses_edits() {
        let (mut handler, _) = handler_with(CONFIG);
        assert_eq!(handler.handle_console_command("lock MAIN"), "World main locked");
        assert!(handler.handle_console_command("worlds").contains("main (0, locked)"));

        let mut alice = login(&mut handler, 1, "alice");
        alice.drain();
        send(
            &mut handler,
            &alice,
            ClientPacket::SetBlock(SetBlockRequest {
                position: BlockPos::new(2, 10, 2),
                mode: mcc_rs_proto::packets::EditMode::Create,
                block: block::STONE,
            }),
        );
        let main = handler.worlds.get("main").unwrap();
        assert_eq!(main.world().get(BlockPos::new(2, 10, 2)), Some(block::AIR));

        handler.handle_console_command("unlock main");
        assert!(!handler.worlds.get("main").unwrap().is_locked());
    }

    #[test]
    fn kick_and_who() {
        let (mut handler, _) = handler_with(CONFIG);
        let mut alice = login(&mut handler, 1, "alice");
        let _bob = login(&mut handler, 2, "bob");
        alice.drain();

        assert_eq!(handler.handle_console_command("who"), "Online (2): alice, bob");
        assert_eq!(handler.handle_console_command("kick ALICE too loud"), "Kicked ALICE");
        assert!(alice.drain().iter().any(|p| matches!(
            p,
            ServerPacket::Disconnect(d) if d.reason == "too loud"
        )));
        assert_eq!(handler.handle_console_command("who"), "Online (1): bob");
        assert_eq!(handler.handle_console_command("kick alice"), "alice is not online");
    }

    #[test]
    fn stop_is_console_only() {
        let (mut handler, shutdown) = handler_with(CONFIG);
        let mut op = login(&mut handler, 1, "op");
        op.drain();

        send(&mut handler, &op, chat("/stop"));
        assert_eq!(op.chat_lines(), vec!["stop can only be used from the console"]);
        assert!(!*shutdown.borrow());

        assert_eq!(handler.handle_console_command("stop"), "Stopping server");
        assert!(*shutdown.borrow());
    }

    #[test]
    fn unknown_and_malformed_commands() {
        let (mut handler, _) = handler_with(CONFIG);
        assert!(handler.handle_console_command("dance").starts_with("Unknown command: dance"));
        assert_eq!(
            handler.handle_console_command("setblock 1 2"),
            "Usage: setblock <x> <y> <z> <block>"
        );
        assert_eq!(
            handler.handle_console_command("newworld huge 4096 4096 4096"),
            "World too large"
        );
        assert_eq!(
            handler.handle_console_command("setblock 1 12 1 49"),
            "Set (1, 12, 1) to 49 in main"
        );
    }
}

use std::{error::Error, io::Write, sync::Arc, time::Duration};

use clap::Parser;
use comfy_table::{presets, CellAlignment, Table};
use lithiumate::{BmsClient, BmsConfig, BridgeTransport, CellVoltage, Limit, RequestDescriptor};
use rustyline::{completion::Completer, history::MemHistory, Editor, Helper, Highlighter, Hinter, Validator};
use tokio::{net::TcpStream, select, sync::Mutex, time::Instant};

use crate::{args::*, hex::format_bytes, util::PrettyDisplay};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

type Client = BmsClient<BridgeTransport>;

pub async fn run(args: Cli) -> Result<(), Box<dyn Error>> {
    let host_port = format!("{}:{}", args.host, args.port);
    let config = BmsConfig {
        request_id: args.request_id,
        speed: args.speed.into(),
    };

    let mut client = ClientImpl::new(config, host_port);

    client.command_loop().await?;

    Ok(())
}

struct ClientImpl {
    config: BmsConfig,
    host_port: String,
    client: Arc<Mutex<Option<Client>>>,
    last_table: Option<Table>,
}

impl ClientImpl {
    pub fn new(config: BmsConfig, addr: String) -> Self {
        Self {
            config,
            host_port: addr,
            client: Arc::new(Mutex::new(None)),
            last_table: None,
        }
    }

    async fn command_loop(&mut self) -> Result<(), Box<dyn Error>> {
        self.connect_if_needed().await?;

        println!("request-id = {:03X}", self.config.request_id);
        println!("speed = {}kbps", self.config.speed.kbps());
        println!();

        let config = rustyline::Config::builder().build();
        let helper = InteractiveHelper {};

        let mut rl = Editor::<InteractiveHelper, MemHistory>::with_history(config, MemHistory::new())?;
        rl.set_helper(Some(helper));
        let rl = Arc::new(Mutex::new(rl));

        loop {
            let _rl = rl.clone();
            let readline = tokio::task::spawn_blocking(move || _rl.blocking_lock().readline("lithiumate-test> ")).await?;

            match readline {
                Ok(line) => {
                    _ = rl.lock().await.add_history_entry(line.as_str());

                    println!();

                    let result = self.handle_command(line).await;

                    if let Ok(true) = result {
                        return Ok(());
                    }

                    if let Err(err) = result {
                        println!("{err}");
                    }

                    println!();
                }
                Err(_) => break,
            }
        }

        Ok(())
    }

    async fn handle_command(&mut self, line: String) -> Result<bool, Box<dyn Error>> {
        let words = shellwords::split(&format!("lithiumate-test> {}", line))?;

        let cmd = Interactive::try_parse_from(words)?;

        let start = Instant::now();

        let result = match &cmd.command {
            InteractiveCommands::Status => self.status().await,
            InteractiveCommands::Read(args) => self.read(args).await,
            InteractiveCommands::Faults => self.faults().await,
            InteractiveCommands::ClearFaults => self.clear_faults().await,
            InteractiveCommands::Raw(args) => self.raw(args).await,
            InteractiveCommands::Watch(args) => self.watch(args).await,
            InteractiveCommands::Export(args) => self.export_csv(args).await,
            InteractiveCommands::Set(args) => match args.command {
                SetCommands::RequestId { request_id } => {
                    self.config.request_id = request_id;
                    if let Some(client) = self.client.lock().await.as_mut() {
                        client.set_request_id(request_id);
                    }
                    println!("request-id = {request_id:03X}");
                    return Ok(false);
                }
            },
            InteractiveCommands::Exit => return Ok(true),
        };

        let dur = Instant::now() - start;

        println!();
        println!("{}: {}ms", cmd.command, dur.as_millis());

        result.map(|_| false)
    }

    async fn status(&mut self) -> Result<(), Box<dyn Error>> {
        let rows = self
            .with_client(|client| {
                let min = client.min_cell_voltage();
                let max = client.max_cell_voltage();
                vec![
                    row("State of charge", client.state_of_charge().to_string(), "%"),
                    row("Depth of discharge", client.depth_of_discharge().to_string(), "%"),
                    row("State of health", client.state_of_health().to_string(), "%"),
                    row("Capacity", client.capacity().to_string(), "Ah"),
                    row("Pack voltage", client.pack_voltage().pretty(), "V"),
                    row("Min cell voltage", cell(min), "V"),
                    row("Avg cell voltage", client.avg_cell_voltage().pretty(), "V"),
                    row("Max cell voltage", cell(max), "V"),
                    row("Pack current", client.pack_current().pretty(), "A"),
                    row("Avg source current", client.average_source_current().pretty(), "A"),
                    row("Avg load current", client.average_load_current().pretty(), "A"),
                    row("Source current", client.source_current().pretty(), "A"),
                    row("Load current", client.load_current().pretty(), "A"),
                    row("Charge limit", limit(client.charge_limit()), "%"),
                    row("Discharge limit", limit(client.discharge_limit()), "%"),
                    row("IO", client.io_status().to_string(), ""),
                ]
            })
            .await?;

        self.print_quantities(rows);

        Ok(())
    }

    async fn read(&mut self, args: &ReadArgs) -> Result<(), Box<dyn Error>> {
        let quantity = args.quantity;

        let value = self
            .with_client(move |client| match quantity {
                Quantity::Soc => row("State of charge", client.state_of_charge().to_string(), "%"),
                Quantity::Dod => row("Depth of discharge", client.depth_of_discharge().to_string(), "%"),
                Quantity::Soh => row("State of health", client.state_of_health().to_string(), "%"),
                Quantity::Capacity => row("Capacity", client.capacity().to_string(), "Ah"),
                Quantity::PackVoltage => row("Pack voltage", client.pack_voltage().pretty(), "V"),
                Quantity::MinCell => row("Min cell voltage", cell(client.min_cell_voltage()), "V"),
                Quantity::AvgCell => row("Avg cell voltage", client.avg_cell_voltage().pretty(), "V"),
                Quantity::MaxCell => row("Max cell voltage", cell(client.max_cell_voltage()), "V"),
                Quantity::PackCurrent => row("Pack current", client.pack_current().pretty(), "A"),
                Quantity::AvgSourceCurrent => row("Avg source current", client.average_source_current().pretty(), "A"),
                Quantity::AvgLoadCurrent => row("Avg load current", client.average_load_current().pretty(), "A"),
                Quantity::SourceCurrent => row("Source current", client.source_current().pretty(), "A"),
                Quantity::LoadCurrent => row("Load current", client.load_current().pretty(), "A"),
                Quantity::ChargeLimit => row("Charge limit", limit(client.charge_limit()), "%"),
                Quantity::DischargeLimit => row("Discharge limit", limit(client.discharge_limit()), "%"),
                Quantity::Io => row("IO", client.io_status().to_string(), ""),
            })
            .await?;

        self.print_quantities(vec![value]);

        Ok(())
    }

    async fn faults(&mut self) -> Result<(), Box<dyn Error>> {
        let faults = self.with_client(|client| client.faults()).await?;

        let mut table = Table::new();
        table.load_preset(presets::NOTHING);
        table.set_header(["Kind", "Message"]);

        for fault in faults.present.iter() {
            table.add_row(["Present", fault.message()]);
        }
        table.add_row(["Stored".to_string(), faults.stored.to_string()]);
        for warning in faults.warnings.iter() {
            table.add_row(["Warning", warning.message()]);
        }

        println!("{table}");

        self.last_table = Some(table);

        Ok(())
    }

    async fn clear_faults(&self) -> Result<(), Box<dyn Error>> {
        self.with_client(|client| client.clear_stored_fault()).await??;

        println!("Stored fault cleared");

        Ok(())
    }

    async fn raw(&mut self, args: &RawArgs) -> Result<(), Box<dyn Error>> {
        let request = RequestDescriptor::new(args.mode, args.pid_hi, args.pid_lo);

        let reply = self.with_client(move |client| client.request(request)).await??;

        let mut table = Table::new();
        table.load_preset(presets::NOTHING);
        table.set_header(["Id", "Length", "Mode", "PID", "Data"]);
        table.add_row([
            format!("{:03X}", reply.id),
            reply.declared_length().to_string(),
            format!("{:02X}", reply.mode()),
            format!("{:02X} {:02X}", reply.pid_hi(), reply.pid_lo()),
            format_bytes(&reply.payload()),
        ]);

        println!("{table}");

        self.last_table = Some(table);

        Ok(())
    }

    async fn watch(&mut self, args: &WatchArgs) -> Result<(), Box<dyn Error>> {
        let interval = args.interval;

        let do_watch = async {
            loop {
                if let Err(err) = self.status().await {
                    return err;
                }
                println!();
                tokio::time::sleep(interval).await;
            }
        };

        select! {
            err = do_watch => return Err(err),
            _ = tokio::signal::ctrl_c() => {}
        };

        Ok(())
    }

    fn print_quantities(&mut self, rows: Vec<[String; 3]>) {
        let mut table = Table::new();
        table.load_preset(presets::NOTHING);
        table.set_header(["Quantity", "Value", "Unit"]);

        if let Some(column) = table.column_mut(1) {
            column.set_cell_alignment(CellAlignment::Right);
        }

        for row in rows {
            table.add_row(row);
        }

        println!("{table}");

        self.last_table = Some(table);
    }

    async fn export_csv(&self, args: &ExportArgs) -> Result<(), Box<dyn Error>> {
        let table = match &self.last_table {
            Some(table) => table,
            None => {
                println!("Nothing to export");
                return Ok(());
            }
        };

        let mut writer = csv::Writer::from_path(&args.filename)?;

        if let Some(header) = table.header() {
            writer.write_record(header.cell_iter().map(|c| c.content()).collect::<Vec<String>>())?;
        }

        for row in table.row_iter() {
            let record = row.cell_iter().map(|c| c.content()).collect::<Vec<String>>();
            writer.write_record(record)?;
        }
        writer.flush()?;

        println!("Exported");

        Ok(())
    }

    /// Run blocking transactions on the connected client.
    async fn with_client<F, R>(&self, f: F) -> Result<R, Box<dyn Error>>
    where
        F: FnOnce(&mut Client) -> R,
    {
        self.connect_if_needed().await?;

        let mut client = self.client.lock().await;
        let client = client.as_mut().ok_or("Not connected")?;

        Ok(tokio::task::block_in_place(|| f(client)))
    }

    async fn connect_if_needed(&self) -> Result<(), Box<dyn Error>> {
        let mut slot = self.client.lock().await;
        if slot.is_some() {
            return Ok(());
        }

        print!("Connecting...");
        std::io::stdout().flush()?;

        let stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&self.host_port)).await??;

        println!(" Connected");
        println!();

        let (transport, handle) = BridgeTransport::connect(stream);

        let mut client = BmsClient::new(transport, self.config);
        if !client.init() {
            return Err("CAN bus initialization failed".into());
        }

        _ = slot.insert(client);
        drop(slot);

        let client_ = self.client.clone();

        tokio::spawn(async move {
            let result = handle.await.unwrap_or(Ok(()));
            _ = client_.lock().await.take();
            println!();
            println!();
            match result {
                Ok(_) => println!("Connection closed"),
                Err(err) => println!("{err}"),
            }
            println!();
        });

        Ok(())
    }
}

fn row(quantity: &str, value: String, unit: &str) -> [String; 3] {
    [quantity.to_string(), value, unit.to_string()]
}

fn cell(voltage: CellVoltage) -> String {
    format!("{} (cell {})", voltage.volts.pretty(), voltage.cell)
}

fn limit(limit: Limit) -> String {
    format!("{} ({})", limit.percent, limit.cause)
}

#[derive(Helper, Hinter, Validator, Highlighter)]
struct InteractiveHelper {}
const COMPLETIONS: [&str; 10] = [
    "status",
    "read ",
    "faults",
    "clear-faults",
    "raw ",
    "watch ",
    "set request-id ",
    "export ",
    "help",
    "exit",
];

impl Completer for InteractiveHelper {
    type Candidate = String;

    fn complete(&self, line: &str, pos: usize, ctx: &rustyline::Context<'_>) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let mut matches = vec![];

        for cmd in COMPLETIONS {
            if cmd.starts_with(line) && pos <= cmd.len() {
                matches.push(String::from(&cmd[pos..]));
            }
        }

        let _ = ctx;
        Ok((pos, matches))
    }
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt};

use game_server::{LogLevel, MessageHandler, RoomManager, ServerSettings, SessionEvent};
use protocol::{BoardConfig, ClientMessage, ConnectFourState, GameRecord, PlayerId};

/// 控制台宿主的一行输入
#[derive(Debug, Deserialize)]
struct ConsoleRequest {
    player_id: PlayerId,
    message: ClientMessage,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 先初始化日志，加载设置时的警告才能输出
    let (filter, filter_handle) = reload::Layer::new(LogLevel::default().env_filter());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // 可选参数：设置文件路径
    let settings = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => ServerSettings::load_from(&path)
            .with_context(|| format!("无法加载设置: {:?}", path))?,
        None => ServerSettings::load(),
    };
    filter_handle
        .reload(settings.log_level.env_filter())
        .context("无法应用日志级别")?;

    info!("四子棋服务端启动中...");
    info!(
        rows = settings.board.rows,
        columns = settings.board.columns,
        win_length = settings.board.win_length,
        gravity = settings.board.gravity,
        "棋盘配置"
    );

    let (events_tx, events_rx) = mpsc::channel(settings.queue_capacity);
    let rooms = Arc::new(RoomManager::new(&settings).with_events(events_tx));
    let events = tokio::spawn(log_events(events_rx, settings.board));

    run_console(&rooms).await?;

    info!(rooms = rooms.count().await, "输入结束，服务端退出");
    drop(rooms);
    events.await.context("事件任务异常退出")?;
    Ok(())
}

/// 从标准输入逐行读取 JSON 请求，响应写到标准输出
async fn run_console(rooms: &RoomManager) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("读取标准输入失败")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request: ConsoleRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                warn!("无法解析请求: {}", e);
                continue;
            }
        };

        let response = MessageHandler::handle(rooms, request.player_id, request.message).await;
        let mut out = serde_json::to_string(&response).context("序列化响应失败")?;
        out.push('\n');
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }

    Ok(())
}

/// 记录快照事件，对局结束时输出棋谱
async fn log_events(mut rx: mpsc::Receiver<SessionEvent<ConnectFourState>>, board: BoardConfig) {
    while let Some(SessionEvent {
        room_id,
        snapshot,
        finished,
    }) = rx.recv().await
    {
        info!(
            room_id,
            session_id = snapshot.session_id,
            status = ?snapshot.status,
            moves = snapshot.state.moves.len(),
            "快照更新"
        );

        if finished {
            let record = GameRecord::from_snapshot(&snapshot, board);
            info!(room_id, result = ?record.metadata.result, "对局结束\n{}", record.to_text());
        }
    }
}

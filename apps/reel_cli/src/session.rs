//! 后台音频会话：在终端里驱动播放列表顺序器

use std::io::BufRead;
use std::thread;

use anyhow::bail;
use crossbeam_channel::{unbounded, Receiver, Sender};
use reel_player::{
    spawn_engine, AudioEngine, EngineConfig, LoadRequest, PlayerEvent, PlaylistSequencer,
    Presentation, SequencerEvent,
};

/// 把通知栏内容打印到终端
pub struct ConsolePresentation;

impl Presentation for ConsolePresentation {
    fn publish(&mut self, title: &str, subtitle: &str) {
        println!("▶ {}  [{}]", title, subtitle);
    }

    fn teardown(&mut self) {
        println!("■ stopped");
    }
}

/// 键盘输入到命令的映射
pub fn parse_key(line: &str) -> Option<SequencerEvent> {
    match line.trim() {
        "" | "t" | "toggle" => Some(SequencerEvent::PlayPause),
        "n" | "next" => Some(SequencerEvent::Next),
        "p" | "prev" | "previous" => Some(SequencerEvent::Previous),
        "q" | "quit" | "s" | "stop" => Some(SequencerEvent::Stop),
        _ => None,
    }
}

/// 会话输入：引擎事件和键盘行汇入同一队列，逐个处理
enum Input {
    Engine(PlayerEvent),
    Key(String),
}

fn forward_engine(evt_rx: Receiver<PlayerEvent>, tx: Sender<Input>) {
    thread::spawn(move || {
        for evt in evt_rx {
            if tx.send(Input::Engine(evt)).is_err() {
                break;
            }
        }
    });
}

fn forward_stdin(tx: Sender<Input>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(Input::Key(line)).is_err() {
                break;
            }
        }
    });
}

/// 处理一条输入；上一个条目迟到的结束/错误事件直接丢弃
fn handle_input<N: Presentation>(sequencer: &mut PlaylistSequencer<AudioEngine, N>, input: Input) {
    match input {
        Input::Engine(evt) if !sequencer.player().is_current(&evt) => {
            log::debug!("stale engine event: {:?}", evt);
        }
        Input::Engine(evt) => match SequencerEvent::from_player_event(&evt) {
            Some(event) => sequencer.dispatch(event),
            None => log::debug!("engine: {:?}", evt),
        },
        Input::Key(line) => match parse_key(&line) {
            Some(event) => sequencer.dispatch(event),
            None => println!("unknown command: {}", line.trim()),
        },
    }
}

/// 加载请求并一直运行到列表播完或用户停止
pub fn run(request: LoadRequest, config: EngineConfig) -> anyhow::Result<()> {
    let (engine, evt_rx) = spawn_engine(config).into_player();
    let mut sequencer = PlaylistSequencer::new(engine, ConsolePresentation);

    let (tx, inputs) = unbounded();
    forward_engine(evt_rx, tx.clone());
    forward_stdin(tx);

    println!("controls: <enter>/t toggle, n next, p previous, q stop");
    sequencer.dispatch(SequencerEvent::Load(request));

    while sequencer.is_active() {
        let Ok(input) = inputs.recv() else {
            bail!("audio engine exited unexpectedly");
        };
        handle_input(&mut sequencer, input);
    }

    Ok(())
}

use std::fs;
use std::io::{self, IsTerminal, Read, Write as _};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::{Hide, MoveTo, SetCursorStyle, Show},
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute, queue,
    terminal::{
        disable_raw_mode, enable_raw_mode, BeginSynchronizedUpdate, EndSynchronizedUpdate,
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::{Paragraph, Widget},
    Terminal,
};

use hxedit::{CursorPaint, CursorShape, HexEdit, OffsetWidth, Options};

/// Terminal hex editor built on the hxedit widget
#[derive(Parser, Debug)]
#[command(name = "hxv")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to open
    #[arg(value_name = "FILE")]
    file: Option<String>,

    /// Bytes per word (1, 2, 4 or 8)
    #[arg(short = 'w', long, default_value = "1")]
    word_size: usize,

    /// Show the offset column
    #[arg(short, long)]
    offsets: bool,

    /// Read-only mode
    #[arg(short, long)]
    readonly: bool,
}

struct App {
    view: HexEdit,
    path: Option<String>,
    status: String,
    should_quit: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 標準入力からデータを読み込む（パイプされている場合）
    let stdin_data = if !io::stdin().is_terminal() {
        let mut data = Vec::new();
        io::stdin().read_to_end(&mut data)?;
        Some(data)
    } else {
        None
    };

    // ターミナルの初期化
    // マウスキャプチャを有効にしてクリック・ドラッグ選択を受け取る
    // Focus Eventsでフォーカス変更を検出
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, args, stdin_data);

    // ターミナルの後処理
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen,
        SetCursorStyle::DefaultUserShape
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    args: Args,
    stdin_data: Option<Vec<u8>>,
) -> Result<()> {
    let view = HexEdit::new(Options {
        bytes_per_word: args.word_size,
        offset_width: if args.offsets {
            OffsetWidth::Bits32
        } else {
            OffsetWidth::None
        },
        read_only: args.readonly,
        ..Options::default()
    })?;
    let mut app = App {
        view,
        path: args.file,
        status: String::new(),
        should_quit: false,
    };

    // データを読み込む（優先順位: ファイル > 標準入力）
    if let Some(ref path) = app.path {
        let data = fs::read(path).with_context(|| format!("failed to read {}", path))?;
        app.view.set_data(data);
    } else if let Some(data) = stdin_data {
        app.view.set_data(data);
    }

    update_title(terminal.backend_mut(), &app)?;

    // メインループ
    loop {
        let mut cursor = CursorPaint {
            visible: false,
            shape: CursorShape::Block,
            x: 0,
            y: 0,
        };
        queue!(terminal.backend_mut(), BeginSynchronizedUpdate)?;
        terminal.draw(|f| {
            let [main, status] =
                Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(f.area());
            cursor = app.view.render(main, f.buffer_mut());
            draw_status(&app, status, f.buffer_mut());
        })?;
        place_cursor(terminal.backend_mut(), cursor)?;
        queue!(terminal.backend_mut(), EndSynchronizedUpdate)?;
        terminal.backend_mut().flush()?;

        if event::poll(Duration::from_millis(100))? {
            let ev = event::read()?;
            handle_event(&mut app, &ev, terminal.backend_mut())?;
        } else {
            // ドラッグ中の画面端スクロール
            app.view.auto_scroll_tick();
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_event(
    app: &mut App,
    ev: &Event,
    backend: &mut CrosstermBackend<io::Stdout>,
) -> Result<()> {
    if let Event::Key(key) = ev {
        if key.kind != KeyEventKind::Release && key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') => {
                    app.should_quit = true;
                    return Ok(());
                }
                KeyCode::Char('s') => {
                    save(app)?;
                    update_title(backend, app)?;
                    return Ok(());
                }
                KeyCode::Char('c') => {
                    copy_selection(app);
                    return Ok(());
                }
                _ => {}
            }
        }
        if key.kind != KeyEventKind::Release && key.code == KeyCode::Esc {
            app.should_quit = true;
            return Ok(());
        }
    }
    let was_modified = app.view.modified();
    app.view.handle_event(ev);
    if app.view.modified() != was_modified {
        update_title(backend, app)?;
    }
    Ok(())
}

fn save(app: &mut App) -> Result<()> {
    let Some(ref path) = app.path else {
        app.status = "no file to save to".into();
        return Ok(());
    };
    fs::write(path, app.view.data()).with_context(|| format!("failed to write {}", path))?;
    app.view.set_modified(false);
    app.status = format!("saved {} bytes", app.view.len());
    Ok(())
}

/// 選択範囲を16進文字列でクリップボードへ
fn copy_selection(app: &mut App) {
    let Some(data) = app.view.selected_data() else {
        app.status = "nothing selected".into();
        return;
    };
    let text: Vec<String> = data.iter().map(|b| format!("{:02x}", b)).collect();
    match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.join(" "))) {
        Ok(()) => app.status = format!("copied {} bytes", data.len()),
        Err(e) => app.status = format!("clipboard error: {}", e),
    }
}

fn draw_status(app: &App, area: Rect, buf: &mut ratatui::buffer::Buffer) {
    let (as_char, offset, shift) = app.view.cursor_location();
    let mode = if app.view.read_only() {
        "RO "
    } else if app.view.insert_mode() {
        "INS"
    } else {
        "OVR"
    };
    let text = format!(
        " {:08x}{} {} {} bytes {}",
        offset,
        if as_char {
            String::new()
        } else {
            format!(":{}", shift)
        },
        mode,
        app.view.len(),
        app.status
    );
    Paragraph::new(text)
        .style(Style::default().fg(Color::Black).bg(Color::Gray))
        .render(area, buf);
}

fn place_cursor(backend: &mut CrosstermBackend<io::Stdout>, cursor: CursorPaint) -> Result<()> {
    if cursor.visible {
        let style = match cursor.shape {
            CursorShape::Bar => SetCursorStyle::SteadyBar,
            CursorShape::Block => SetCursorStyle::SteadyBlock,
        };
        queue!(backend, MoveTo(cursor.x, cursor.y), style, Show)?;
    } else {
        queue!(backend, Hide)?;
    }
    Ok(())
}

/// ウィンドウタイトルを更新
fn update_title(backend: &mut CrosstermBackend<io::Stdout>, app: &App) -> Result<()> {
    let title = format!(
        "hxv - {}{}",
        app.path.as_deref().unwrap_or("[stdin]"),
        if app.view.modified() { " [+]" } else { "" }
    );
    execute!(backend, SetTitle(&title))?;
    Ok(())
}

use std::{
    future,
    io::{self, Write},
    time::Duration,
};

use crossterm::{
    cursor,
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture, Event, EventStream,
        KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    },
    style::Print,
    terminal::{self, ClearType},
};
use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use super::{Process, ProcessOutput};
use crate::{
    cli::TimerProcess,
    config::{Config, Theme},
    errors::Result,
    format_warning,
    service::{ActivityTracker, DevService},
};

/// Period of the active time display refresh
const DISPLAY_PERIOD: Duration = Duration::from_secs(1);

impl Process for TimerProcess {
    async fn execute(
        self,
        config: Config,
        _service: DevService,
        cancellation_token: CancellationToken,
    ) -> Result<ProcessOutput> {
        let tracker = ActivityTracker::new(&cancellation_token);
        tracker.start();

        // Listen to terminal events, if possible
        let raw_terminal = match listen_input(&tracker, &config.theme, || {
            let raw_terminal = RawTerminal::enter()?;
            Ok((raw_terminal, input_events(cancellation_token.clone())))
        }) {
            Ok(raw_terminal) => Some(raw_terminal),
            Err(warning) => {
                println!("{warning}");
                None
            }
        };
        let stop_keys = if raw_terminal.is_some() { "q, Esc or Ctrl+C" } else { "Ctrl+C" };
        let intro = print_line(&config.theme.secondary.apply(format!("Press {stop_keys} to stop")).to_string())
            .and_then(|_| print_line(""));
        if let Err(err) = intro {
            tracker.stop();
            return Err(err.into());
        }

        let (total, rendered) = display_active_time(&tracker, &cancellation_token, render_active_time).await;
        drop(raw_terminal);
        println!();
        rendered?;

        Ok(ProcessOutput::success().stdout(format!(
            "Total active time: {}",
            config.theme.accent.apply(format_hms(total))
        )))
    }
}

/// Starts feeding the tracker with the input events of the given setup.
///
/// Returns the guard to keep alive while listening, or the warning to display when the events are not available.
fn listen_input<G, S>(
    tracker: &ActivityTracker,
    theme: &Theme,
    setup: impl FnOnce() -> io::Result<(G, S)>,
) -> Result<G, String>
where
    S: Stream + Send + 'static,
    S::Item: Send,
{
    match setup() {
        Ok((guard, events)) => {
            tracker.listen(events);
            Ok(guard)
        }
        Err(err) => {
            tracing::warn!("Couldn't listen to terminal events: {err}");
            Err(format_warning!(
                theme,
                "Couldn't listen to input events, active time won't increase"
            ))
        }
    }
}

/// Renders the active time every [DISPLAY_PERIOD] until cancelled or the rendering fails.
///
/// The tracker is always stopped on return, along with the total active seconds.
async fn display_active_time(
    tracker: &ActivityTracker,
    cancellation_token: &CancellationToken,
    mut render: impl FnMut(u64) -> io::Result<()>,
) -> (u64, io::Result<()>) {
    let mut interval = tokio::time::interval(DISPLAY_PERIOD);
    let rendered = loop {
        tokio::select! {
            biased;
            _ = cancellation_token.cancelled() => break Ok(()),
            _ = interval.tick() => {
                if let Err(err) = render(tracker.active_seconds()) {
                    tracing::error!("Couldn't render the active time: {err}");
                    break Err(err);
                }
            }
        }
    };
    (tracker.stop(), rendered)
}

/// Formats seconds as `HH:MM:SS`
fn format_hms(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let seconds = seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Prints a full line, which requires an explicit carriage return on raw mode
fn print_line(line: &str) -> io::Result<()> {
    crossterm::execute!(io::stdout(), Print(line), Print("\r\n"))
}

/// Re-renders the active time on the current line
fn render_active_time(seconds: u64) -> io::Result<()> {
    let mut stdout = io::stdout();
    crossterm::queue!(
        stdout,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(format!("⏱  Active time: {}", format_hms(seconds)))
    )?;
    stdout.flush()
}

/// Whether the key stops the timer, on raw mode SIGINT is no longer received so Ctrl+C must be handled manually
fn is_stop_key(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        KeyCode::Char('q') | KeyCode::Esc => true,
        _ => false,
    }
}

/// Stream of user input events from the terminal, cancelling the token when a stop key is pressed
fn input_events(cancellation_token: CancellationToken) -> impl Stream<Item = ()> + Send + 'static {
    EventStream::new()
        .take_while(|event| {
            if let Err(err) = event {
                tracing::error!("Error retrieving next terminal event: {err}");
            }
            future::ready(event.is_ok())
        })
        .filter_map(move |event| {
            let activity = match event {
                // Process only key press events to avoid duplicate events for release/repeat
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if is_stop_key(&key) {
                        tracing::debug!("Stop key received, cancelling token");
                        cancellation_token.cancel();
                    }
                    Some(())
                }
                Ok(Event::Mouse(_) | Event::Paste(_)) => Some(()),
                _ => None,
            };
            future::ready(activity)
        })
}

/// Guard that keeps the terminal on raw mode, capturing mouse and paste events, until dropped
struct RawTerminal;

impl RawTerminal {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let guard = RawTerminal;
        crossterm::execute!(io::stdout(), EnableMouseCapture, EnableBracketedPaste, cursor::Hide)?;
        Ok(guard)
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        if let Err(err) = crossterm::execute!(io::stdout(), DisableBracketedPaste, DisableMouseCapture, cursor::Show)
        {
            tracing::error!("Couldn't restore the terminal: {err}");
        }
        if let Err(err) = terminal::disable_raw_mode() {
            tracing::error!("Couldn't disable raw mode: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use futures_util::stream;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::service::ActivityStatus;

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(59), "00:00:59");
        assert_eq!(format_hms(61), "00:01:01");
        assert_eq!(format_hms(3600), "01:00:00");
        assert_eq!(format_hms(3 * 3600 + 25 * 60 + 7), "03:25:07");
    }

    #[test]
    fn test_stop_keys() {
        assert!(is_stop_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(is_stop_key(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_stop_key(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(!is_stop_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_stop_key(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_display_without_input_events() {
        let token = CancellationToken::new();
        let tracker = ActivityTracker::new(&token);
        tracker.start();

        let res = listen_input::<(), stream::Empty<()>>(&tracker, &Theme::default(), || {
            Err(io::Error::other("not a terminal"))
        });
        let warning = res.unwrap_err();
        assert!(warning.contains("Couldn't listen to input events"));

        tokio::spawn({
            let token = token.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(3500)).await;
                token.cancel();
            }
        });
        let mut renders = Vec::new();
        let (total, rendered) = display_active_time(&tracker, &token, |seconds| {
            renders.push(seconds);
            Ok(())
        })
        .await;

        assert!(rendered.is_ok());
        assert_eq!(total, 0);
        assert!(!renders.is_empty());
        assert!(renders.iter().all(|s| *s == 0));
        assert_eq!(tracker.status(), ActivityStatus::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_display_render_failure_stops_tracker() {
        let token = CancellationToken::new();
        let tracker = ActivityTracker::new(&token);
        tracker.start();

        let (_, rendered) =
            display_active_time(&tracker, &token, |_| Err(io::Error::other("stdout closed"))).await;

        assert!(rendered.is_err());
        assert_eq!(tracker.status(), ActivityStatus::Stopped);
        assert!(!token.is_cancelled());
    }
}

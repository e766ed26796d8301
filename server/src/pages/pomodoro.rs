// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use common::{PomodoroSession, SessionListing, Task, TaskProgress, User, UserSettings};

use super::{datetime, escape, layout};

/// Everything shown on a task's timer page.
pub struct TaskDetail<'a> {
    pub task: &'a Task,
    pub settings: &'a UserSettings,
    pub today_sessions: i64,
    pub recent_sessions: &'a [PomodoroSession],
    pub progress: TaskProgress,
}

const TIMER_SCRIPT: &str = r#"
<script>
(function () {
  const root = document.getElementById('timer');
  const durations = {
    work: Number(root.dataset.work) * 60,
    short_break: Number(root.dataset.shortBreak) * 60,
    long_break: Number(root.dataset.longBreak) * 60,
  };
  const cycles = Number(root.dataset.cycles);
  const taskId = Number(root.dataset.taskId);
  let phase = 'work';
  let left = durations.work;
  let done = 0;
  let sessionId = null;
  let interval = null;

  async function post(url, body) {
    const response = await fetch(url, {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify(body),
    });
    return response.json();
  }

  function render() {
    const m = String(Math.floor(left / 60)).padStart(2, '0');
    const s = String(left % 60).padStart(2, '0');
    document.getElementById('timer-display').textContent = m + ':' + s;
    document.getElementById('timer-phase').textContent = phase.replace('_', ' ');
  }

  async function finish(status) {
    clearInterval(interval);
    interval = null;
    if (sessionId === null) { return; }
    const result = await post('/pomodoro/api/end_session/', { session_id: sessionId, status: status });
    sessionId = null;
    if (result.task_progress) {
      document.getElementById('progress').textContent =
        result.task_progress.completed + '/' + result.task_progress.total +
        ' (' + Math.round(result.task_progress.percentage) + '%)';
    }
    if (status === 'completed') {
      if (phase === 'work') {
        done += 1;
        phase = done % cycles === 0 ? 'long_break' : 'short_break';
      } else {
        phase = 'work';
      }
    }
    left = durations[phase];
    render();
  }

  document.getElementById('start-timer').addEventListener('click', async function () {
    if (interval !== null) { return; }
    if (sessionId === null) {
      const result = await post('/pomodoro/api/start_session/', { task_id: taskId, session_type: phase });
      if (!result.success) { alert(result.error); return; }
      sessionId = result.session_id;
    }
    interval = setInterval(function () {
      left -= 1;
      render();
      if (left <= 0) { finish('completed'); }
    }, 1000);
  });
  document.getElementById('pause-timer').addEventListener('click', function () {
    clearInterval(interval);
    interval = null;
  });
  document.getElementById('stop-timer').addEventListener('click', function () { finish('interrupted'); });
  render();
})();
</script>
"#;

fn session_row(session: &PomodoroSession) -> String {
    format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        session.session_type.label(),
        datetime(Some(session.start_time)),
        datetime(session.end_time),
        if session.is_running() {
            "running"
        } else {
            session.status.label()
        },
    )
}

pub fn task_detail(user: &User, detail: &TaskDetail<'_>) -> String {
    let task = detail.task;
    let settings = detail.settings;
    let recent: String = detail.recent_sessions.iter().map(session_row).collect();

    let body = format!(
        r#"<h1>{title}</h1>
<p>{description}</p>
<p>Progress: <span id="progress">{completed}/{total} ({percentage:.0}%)</span>
| Sessions today: {today}</p>
<div id="timer" data-task-id="{id}" data-work="{work}" data-short-break="{short}" data-long-break="{long}" data-cycles="{cycles}">
<h2 id="timer-display"></h2>
<p id="timer-phase"></p>
<button id="start-timer" type="button">Start</button>
<button id="pause-timer" type="button">Pause</button>
<button id="stop-timer" type="button">Stop</button>
</div>
<form method="post" action="/pomodoro/task/{id}/complete/" onsubmit="event.preventDefault(); fetch(this.action, {{method: 'POST'}}).then(r => r.json()).then(r => {{ if (r.success) window.location = r.redirect_url; }});">
<button type="submit">Mark task completed</button>
</form>
<h2>Recent sessions</h2>
<table><tr><th>Type</th><th>Started</th><th>Ended</th><th>Status</th></tr>{recent}</table>
{script}"#,
        title = escape(&task.title),
        description = escape(&task.description),
        completed = detail.progress.completed,
        total = detail.progress.total,
        percentage = detail.progress.percentage,
        today = detail.today_sessions,
        id = task.id,
        work = settings.pomodoro_duration,
        short = settings.short_break_duration,
        long = settings.long_break_duration,
        cycles = settings.pomodoros_before_long_break,
        recent = recent,
        script = TIMER_SCRIPT,
    );
    layout(&task.title, Some(user), &body)
}

pub fn history(user: &User, sessions: &[SessionListing]) -> String {
    let rows: String = sessions
        .iter()
        .map(|listing| {
            let session = &listing.session;
            format!(
                r#"<tr><td><a href="/pomodoro/task/{task_id}/">{title}</a></td><td>{kind}</td><td>{start}</td><td>{end}</td><td>{minutes}</td><td>{status}</td></tr>"#,
                task_id = session.task_id,
                title = escape(&listing.task_title),
                kind = session.session_type.label(),
                start = datetime(Some(session.start_time)),
                end = datetime(session.end_time),
                minutes = session
                    .duration_secs()
                    .map(|secs| (secs / 60).to_string())
                    .unwrap_or_else(|| "-".to_string()),
                status = if session.is_running() {
                    "running"
                } else {
                    session.status.label()
                },
            )
        })
        .collect();

    let body = if sessions.is_empty() {
        "<h1>Session history</h1><p>No sessions yet.</p>".to_string()
    } else {
        format!(
            "<h1>Session history</h1>\n<table><tr><th>Task</th><th>Type</th><th>Started</th><th>Ended</th><th>Minutes</th><th>Status</th></tr>{}</table>",
            rows
        )
    };
    layout("Session history", Some(user), &body)
}

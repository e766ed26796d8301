// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use common::User;

use super::{escape, layout};

pub fn home(user: Option<&User>) -> String {
    let call_to_action = match user {
        Some(user) => format!(
            r#"<p>Welcome back, {}.</p>
<p><a href="/tasks/matrix/">Open your matrix</a> or <a href="/pomodoro/sessions/">review your sessions</a>.</p>"#,
            escape(&user.display_name())
        ),
        None => r#"<p><a href="/users/register/">Create an account</a> or <a href="/users/login/">log in</a> to start planning.</p>"#
            .to_string(),
    };
    layout(
        "Home",
        user,
        &format!(
            r#"<h1>TaskFocus</h1>
<p>Sort your work by urgency and importance, then get it done one focused pomodoro at a time.</p>
{}"#,
            call_to_action
        ),
    )
}

pub fn about(user: Option<&User>) -> String {
    layout(
        "About",
        user,
        r#"<h1>About TaskFocus</h1>
<p>TaskFocus combines the Eisenhower priority matrix with the Pomodoro technique.
Tasks are dragged into one of four quadrants, and each task can be worked on in
timed sessions whose completed count is tracked against an estimate.</p>"#,
    )
}

pub fn eisenhower_method(user: Option<&User>) -> String {
    layout(
        "The Eisenhower method",
        user,
        r#"<h1>The Eisenhower method</h1>
<p>Every task is judged on two questions: is it urgent, and is it important?</p>
<ol>
<li><strong>Urgent and important</strong>: do it now.</li>
<li><strong>Important, not urgent</strong>: schedule it. This is where long-term progress happens.</li>
<li><strong>Urgent, not important</strong>: delegate or batch it.</li>
<li><strong>Neither</strong>: drop it.</li>
</ol>"#,
    )
}

pub fn pomodoro_technique(user: Option<&User>) -> String {
    layout(
        "The Pomodoro technique",
        user,
        r#"<h1>The Pomodoro technique</h1>
<ol>
<li>Pick a task.</li>
<li>Work on it for one pomodoro (25 minutes by default).</li>
<li>Take a short break (5 minutes).</li>
<li>After four pomodoros, take a long break (15 minutes).</li>
</ol>
<p>Durations can be changed from your profile.</p>"#,
    )
}

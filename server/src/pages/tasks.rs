// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use common::{Quadrant, Task, User};

use super::{escape, layout};

const MATRIX_SCRIPT: &str = r#"
<script>
(function () {
  let dragged = null;

  async function post(url, body, json) {
    const response = await fetch(url, {
      method: 'POST',
      headers: { 'Content-Type': json ? 'application/json' : 'application/x-www-form-urlencoded' },
      body: json ? JSON.stringify(body) : new URLSearchParams(body),
    });
    return response.json();
  }

  document.querySelectorAll('.task').forEach(function (card) {
    card.addEventListener('dragstart', function () { dragged = card; });
    card.addEventListener('dragend', function () { dragged = null; });
  });

  document.querySelectorAll('[data-quadrant-id]').forEach(function (zone) {
    zone.addEventListener('dragover', function (e) { e.preventDefault(); });
    zone.addEventListener('drop', async function (e) {
      e.preventDefault();
      if (!dragged) { return; }
      const card = dragged;
      const result = await post('/tasks/tasks/reorder/', {
        task_id: Number(card.dataset.taskId),
        new_quadrant_id: Number(zone.dataset.quadrantId),
        new_order: zone.querySelectorAll('.task').length,
      }, true);
      if (result.success) { zone.querySelector('.tasks').appendChild(card); }
      else { alert(result.error || 'Could not move the task'); }
    });
  });

  const form = document.getElementById('create-task');
  form.addEventListener('submit', async function (e) {
    e.preventDefault();
    const result = await post('/tasks/matrix/', {
      title: form.title.value,
      description: form.description.value,
    }, false);
    if (result.success) { window.location.reload(); }
    else { document.getElementById('create-errors').textContent = Object.values(result.errors || {}).flat().join(' '); }
  });

  document.querySelectorAll('[data-delete]').forEach(function (button) {
    button.addEventListener('click', async function () {
      if (!confirm('Delete this task?')) { return; }
      const result = await post('/tasks/task/' + button.dataset.delete + '/delete/', {}, false);
      if (result.success) { button.closest('.task').remove(); }
    });
  });
})();
</script>
"#;

fn task_card(task: &Task) -> String {
    let progress = task.progress();
    format!(
        r#"<div class="task" draggable="true" data-task-id="{id}">
<a href="/pomodoro/task/{id}/"><strong>{title}</strong></a>
<small>{completed}/{total} pomodoros</small>
<div>{description}</div>
<button type="button" data-delete="{id}">Delete</button>
</div>"#,
        id = task.id,
        title = escape(&task.title),
        completed = progress.completed,
        total = progress.total,
        description = escape(&task.description),
    )
}

/// The matrix page: the unassigned pool followed by the four quadrants.
pub fn matrix(user: &User, quadrants: &[Quadrant], unassigned: &[Task], assigned: &[Task]) -> String {
    let pool: String = unassigned.iter().map(task_card).collect();
    let grid: String = quadrants
        .iter()
        .map(|quadrant| {
            let cards: String = assigned
                .iter()
                .filter(|task| task.quadrant_id == Some(quadrant.id))
                .map(task_card)
                .collect();
            format!(
                r#"<section class="quadrant" id="quadrant-{id}" data-quadrant-id="{id}" style="border-top: 6px solid {color}">
<h2>{name}</h2>
<p>{description}</p>
<div class="tasks">{cards}</div>
</section>"#,
                id = quadrant.id,
                color = escape(&quadrant.color_code),
                name = escape(&quadrant.name),
                description = escape(&quadrant.description),
                cards = cards,
            )
        })
        .collect();

    let body = format!(
        r#"<h1>Eisenhower matrix</h1>
<form id="create-task">
<input type="text" name="title" maxlength="200" placeholder="New task" required>
<input type="text" name="description" placeholder="Description">
<button type="submit">Add</button>
<span id="create-errors" class="errorlist"></span>
</form>
<section class="pool" id="quadrant-0" data-quadrant-id="0">
<h2>Unsorted tasks</h2>
<div class="tasks">{pool}</div>
</section>
<div class="matrix">{grid}</div>
{script}"#,
        pool = pool,
        grid = grid,
        script = MATRIX_SCRIPT,
    );
    layout("Matrix", Some(user), &body)
}

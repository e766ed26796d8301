// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::response::Html;

use crate::auth::MaybeUser;
use crate::pages;

pub async fn home(MaybeUser(user): MaybeUser) -> Html<String> {
    Html(pages::site::home(user.as_ref()))
}

pub async fn about(MaybeUser(user): MaybeUser) -> Html<String> {
    Html(pages::site::about(user.as_ref()))
}

pub async fn eisenhower_method(MaybeUser(user): MaybeUser) -> Html<String> {
    Html(pages::site::eisenhower_method(user.as_ref()))
}

pub async fn pomodoro_technique(MaybeUser(user): MaybeUser) -> Html<String> {
    Html(pages::site::pomodoro_technique(user.as_ref()))
}

use strum::IntoEnumIterator;
use tokio_util::sync::CancellationToken;

use super::{Process, ProcessOutput, print_block, spinner};
use crate::{
    cli::ApiProcess,
    config::Config,
    errors::{AppError, Result},
    format_error, format_warning,
    model::{HttpBody, HttpMethod, HttpRequest},
    service::{DISPLAY_BODY_LIMIT, DevService, parse_json_headers},
    utils::{Prompter, truncate_for_display},
};

impl Process for ApiProcess {
    async fn execute(
        self,
        config: Config,
        service: DevService,
        cancellation_token: CancellationToken,
    ) -> Result<ProcessOutput> {
        let prompt = Prompter::new(&config.theme, &cancellation_token);
        let interactive = self.url.is_none();

        let method = match self.method {
            Some(method) => method,
            None => prompt.select("Method", &HttpMethod::iter().collect::<Vec<_>>()).await?,
        };
        let url = match self.url {
            Some(url) => url,
            None => prompt.required("URL").await?,
        };

        let mut headers = self.headers;
        if interactive && prompt.confirm("Add headers?", false).await? {
            let raw = prompt.text("Headers JSON").await?;
            match parse_json_headers(&raw) {
                Some(parsed) => headers.extend(parsed),
                None => println!("{}", format_warning!(config.theme, "Invalid JSON ignored")),
            }
        }

        let mut body = self.body.map(HttpBody::parse);
        if method.allows_body() {
            if body.is_none() && interactive && prompt.confirm("Send body?", false).await? {
                body = Some(HttpBody::parse(prompt.text("Body").await?));
            }
        } else if body.take().is_some() {
            println!(
                "{}",
                format_warning!(config.theme, "Body ignored, {method} requests can't have one")
            );
        }

        let request = HttpRequest {
            method,
            url,
            headers,
            body,
        };
        let pb = spinner("Calling ...");
        let res = service.send_request(request, &cancellation_token).await;
        pb.finish_and_clear();
        let response = res?;

        let status_line = format!("{} {}", response.status, response.reason);
        if response.status < 400 {
            println!("{}", config.theme.success.apply(status_line));
        } else {
            println!("{}", config.theme.warning.apply(status_line));
        }
        println!("{}", truncate_for_display(&response.body, DISPLAY_BODY_LIMIT));

        if self.no_analysis {
            return Ok(ProcessOutput::success());
        }

        // A failed analysis doesn't fail the whole request
        let pb = spinner("AI analyzing ...");
        let res = service.analyze_response(&response, &cancellation_token).await;
        pb.finish_and_clear();
        match res {
            Ok(summary) => {
                print_block(&config, "AI Analysis", &summary);
                Ok(ProcessOutput::success())
            }
            Err(AppError::UserFacing(err)) => Ok(ProcessOutput::fail().stderr(format_error!(config.theme, "{err}"))),
            Err(err) => Err(err),
        }
    }
}

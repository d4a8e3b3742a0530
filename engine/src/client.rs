use {
    crate::protocol::{
        CommandReply, ForceReport, GraspCommand, GraspState, GraspStatusReply,
        StatusReport,
    },
    std::time::Duration,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(Box<ureq::Error>),

    #[error("Backend replied with status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Malformed reply: {source}")]
    Decode {
        #[from]
        source: std::io::Error,
    },

    #[error("Command rejected: {msg}")]
    Rejected { msg: String },
}

impl From<ureq::Error> for ClientError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => ClientError::Status {
                code,
                body: response.into_string().unwrap_or_default(),
            },
            err => ClientError::Transport(Box::new(err)),
        }
    }
}

/// Requests the dashboard issues against the hand backend.
pub trait Backend: Send + Sync {
    fn status(&self) -> Result<StatusReport, ClientError>;

    fn force_data(&self) -> Result<ForceReport, ClientError>;

    fn grasp_status(&self) -> Result<GraspState, ClientError>;

    /// Moves a single degree of freedom to `value`.
    /// Returns the backend's confirmation text.
    fn set_dof(&self, dof: u8, value: i32) -> Result<String, ClientError>;

    /// Issues a named command token such as `reset_grasp`.
    fn command(&self, cmd: &str) -> Result<CommandReply, ClientError>;

    fn grasp(&self, cmd: GraspCommand) -> Result<CommandReply, ClientError>;
}

/// [`Backend`] talking plain HTTP to the hand server.
pub struct HttpBackend {
    agent: ureq::Agent,
    base: String,
}

impl HttpBackend {
    pub fn new(base: &str, timeout: Duration) -> Self {
        HttpBackend {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            base: base.trim_end_matches('/').to_owned(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    fn send_command(
        &self,
        path: &str,
        cmd: &str,
    ) -> Result<CommandReply, ClientError> {
        let result = self
            .agent
            .post(&self.url(path))
            .send_json(serde_json::json!({ "cmd": cmd }));

        let reply: CommandReply = match result {
            Ok(response) => response.into_json()?,
            Err(ureq::Error::Status(code, response)) => {
                // Rejections usually carry a JSON body with a message.
                let body = response.into_string().unwrap_or_default();
                match serde_json::from_str::<CommandReply>(&body) {
                    Ok(reply) => reply,
                    Err(_) => return Err(ClientError::Status { code, body }),
                }
            }
            Err(err) => return Err(err.into()),
        };

        if reply.is_ok() {
            Ok(reply)
        } else {
            Err(ClientError::Rejected {
                msg: reply.msg.unwrap_or(reply.status),
            })
        }
    }
}

impl Backend for HttpBackend {
    #[tracing::instrument(skip(self))]
    fn status(&self) -> Result<StatusReport, ClientError> {
        let response = self.agent.get(&self.url("status")).call()?;
        Ok(response.into_json()?)
    }

    #[tracing::instrument(skip(self))]
    fn force_data(&self) -> Result<ForceReport, ClientError> {
        let response = self.agent.get(&self.url("force_data")).call()?;
        Ok(response.into_json()?)
    }

    #[tracing::instrument(skip(self))]
    fn grasp_status(&self) -> Result<GraspState, ClientError> {
        let response = self.agent.get(&self.url("grasp_status")).call()?;
        let reply: GraspStatusReply = response.into_json()?;
        Ok(reply.state())
    }

    #[tracing::instrument(skip(self))]
    fn set_dof(&self, dof: u8, value: i32) -> Result<String, ClientError> {
        let response = self
            .agent
            .post(&self.url("set_dof"))
            .query("dof", &dof.to_string())
            .query("value", &value.to_string())
            .call()?;
        Ok(response.into_string()?)
    }

    #[tracing::instrument(skip(self))]
    fn command(&self, cmd: &str) -> Result<CommandReply, ClientError> {
        self.send_command("command", cmd)
    }

    #[tracing::instrument(skip(self))]
    fn grasp(&self, cmd: GraspCommand) -> Result<CommandReply, ClientError> {
        self.send_command("grasp", cmd.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_without_double_slashes() {
        let backend =
            HttpBackend::new("http://hand.local:5000/", Duration::from_secs(1));
        assert_eq!(backend.url("status"), "http://hand.local:5000/status");
        assert_eq!(
            backend.url("/force_data"),
            "http://hand.local:5000/force_data"
        );
    }
}

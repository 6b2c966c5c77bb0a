use std::fmt;

/// One stage of a pipeline. Stages form a singly linked, owned chain: the
/// head owns the whole chain and dropping it releases every later stage.
#[derive(Debug, Clone, Default)]
pub struct Command {
    pub name: String,
    pub arguments: Vec<String>,
    pub redirects: Redirects,
    /// True iff the whole input line ended with `&`. Only the head node
    /// carries a meaningful value; the pipeline backgrounds as a unit.
    pub background: bool,
    /// True iff the line ended with the completion-request marker. The line
    /// editor owns completion; this is only surfaced.
    pub auto_complete: bool,
    pub next: Option<Box<Command>>,
}

/// The three redirect slots of a stage, each independently optional.
#[derive(Debug, Clone, Default)]
pub struct Redirects {
    pub input: Option<String>,
    pub truncate: Option<String>,
    pub append: Option<String>,
}

impl Command {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.next.is_none()
    }

    /// Iterate the chain from this node to the last stage.
    pub fn stages(&self) -> Stages<'_> {
        Stages {
            current: Some(self),
        }
    }
}

pub struct Stages<'a> {
    current: Option<&'a Command>,
}

impl<'a> Iterator for Stages<'a> {
    type Item = &'a Command;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.current?;
        self.current = node.next.as_deref();
        Some(node)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.arguments {
            write!(f, " {}", arg)?;
        }
        if let Some(path) = &self.redirects.input {
            write!(f, " <{}", path)?;
        }
        if let Some(path) = &self.redirects.truncate {
            write!(f, " >{}", path)?;
        }
        if let Some(path) = &self.redirects.append {
            write!(f, " >>{}", path)?;
        }
        if let Some(next) = &self.next {
            write!(f, " | {}", next)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_iteration_order() {
        let chain = Command {
            name: String::from("a"),
            next: Some(Box::new(Command {
                name: String::from("b"),
                next: Some(Box::new(Command {
                    name: String::from("c"),
                    ..Command::default()
                })),
                ..Command::default()
            })),
            ..Command::default()
        };
        let names: Vec<&str> = chain.stages().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_display_renders_the_whole_chain() {
        let mut head = Command {
            name: String::from("grep"),
            arguments: vec![String::from("foo")],
            ..Command::default()
        };
        head.redirects.truncate = Some(String::from("out.txt"));
        head.next = Some(Box::new(Command {
            name: String::from("wc"),
            ..Command::default()
        }));
        assert_eq!(head.to_string(), "grep foo >out.txt | wc");
    }
}

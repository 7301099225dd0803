// src/config/schema.rs

//! JSON schema of the config file, emitted by `ot schema`.

pub const CONFIG_SCHEMA: &str = r##"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "title": "ot workflow config",
  "type": "object",
  "properties": {
    "workflows": {
      "type": "object",
      "additionalProperties": {
        "oneOf": [
          { "type": "array", "items": { "$ref": "#/definitions/step" } },
          {
            "type": "object",
            "properties": {
              "steps": { "type": "array", "items": { "$ref": "#/definitions/step" } }
            },
            "required": ["steps"]
          }
        ]
      }
    },
    "worktree": {
      "type": "object",
      "properties": {
        "defaults": {
          "type": "object",
          "properties": {
            "base_dir": { "type": "string" }
          }
        },
        "hooks": {
          "type": "object",
          "properties": {
            "post_create": {
              "type": "array",
              "items": { "$ref": "#/definitions/hook" }
            }
          }
        }
      }
    }
  },
  "definitions": {
    "step": {
      "type": "object",
      "properties": {
        "name": { "type": "string", "minLength": 1 },
        "description": { "type": "string" },
        "dependsOn": { "type": "array", "items": { "type": "string" } },
        "branches": { "type": "array", "items": { "type": "string" } },
        "cmd": { "type": "string" },
        "worktree:cp": {
          "type": "object",
          "properties": {
            "from": { "type": "string" },
            "files": { "type": "array", "items": { "type": "string" } },
            "allowMissing": { "type": "boolean" }
          },
          "required": ["from", "files"]
        },
        "bun": {
          "type": "object",
          "properties": {
            "script": { "type": "string" },
            "timeout": { "type": "integer", "minimum": 1 },
            "dependsOn": { "type": "array", "items": { "type": "string" } }
          },
          "required": ["script"]
        }
      },
      "required": ["name"]
    },
    "hook": {
      "oneOf": [
        {
          "type": "object",
          "properties": {
            "type": { "const": "copy" },
            "from": { "type": "string" },
            "to": { "type": "string" }
          },
          "required": ["type", "from", "to"]
        },
        {
          "type": "object",
          "properties": {
            "cmd": { "type": "string" }
          },
          "required": ["cmd"]
        }
      ]
    }
  }
}"##;
